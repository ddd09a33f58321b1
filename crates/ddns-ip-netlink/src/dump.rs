//! `RTM_GETLINK` / `RTM_GETADDR` dumps over a blocking `NETLINK_ROUTE` socket

use ddns_core::{Error, Result};
use netlink_packet_core::{
    NLM_F_DUMP, NLM_F_REQUEST, NetlinkHeader, NetlinkMessage, NetlinkPayload,
};
use netlink_packet_route::address::nlas::Nla as AddressNla;
use netlink_packet_route::link::nlas::Nla as LinkNla;
use netlink_packet_route::{AddressMessage, LinkMessage, RtnlMessage};
use netlink_sys::protocols::NETLINK_ROUTE;
use netlink_sys::{Socket, SocketAddr};

use crate::{RawAddress, RawLink};

/// Large enough for one dump datagram; the kernel never splits a message
const RECEIVE_BUFFER_SIZE: usize = 1 << 16;

/// Dump every link and every address known to the kernel
pub(crate) fn dump() -> Result<(Vec<RawLink>, Vec<RawAddress>)> {
    let mut socket = Socket::new(NETLINK_ROUTE)
        .map_err(|e| Error::interface(format!("Failed to open netlink socket: {}", e)))?;
    socket
        .bind_auto()
        .map_err(|e| Error::interface(format!("Failed to bind netlink socket: {}", e)))?;
    socket
        .connect(&SocketAddr::new(0, 0))
        .map_err(|e| Error::interface(format!("Failed to connect netlink socket: {}", e)))?;

    let links = request(&socket, RtnlMessage::GetLink(LinkMessage::default()))?
        .into_iter()
        .filter_map(|message| match message {
            RtnlMessage::NewLink(link) => Some(raw_link(link)),
            _ => None,
        })
        .collect();

    let addresses = request(&socket, RtnlMessage::GetAddress(AddressMessage::default()))?
        .into_iter()
        .filter_map(|message| match message {
            RtnlMessage::NewAddress(address) => raw_address(address),
            _ => None,
        })
        .collect();

    Ok((links, addresses))
}

/// Send one dump request and collect every reply until `NLMSG_DONE`
fn request(socket: &Socket, message: RtnlMessage) -> Result<Vec<RtnlMessage>> {
    let mut header = NetlinkHeader::default();
    header.flags = NLM_F_REQUEST | NLM_F_DUMP;

    let mut packet = NetlinkMessage::new(header, NetlinkPayload::from(message));
    packet.finalize();

    let mut buf = vec![0; packet.buffer_len()];
    packet.serialize(&mut buf[..]);

    socket
        .send(&buf[..], 0)
        .map_err(|e| Error::interface(format!("Failed to send netlink request: {}", e)))?;

    let mut messages = Vec::new();
    let mut receive_buffer = vec![0; RECEIVE_BUFFER_SIZE];

    loop {
        let size = socket
            .recv(&mut &mut receive_buffer[..], 0)
            .map_err(|e| Error::interface(format!("Failed to receive netlink reply: {}", e)))?;

        let mut offset = 0;
        while offset < size {
            let reply = NetlinkMessage::<RtnlMessage>::deserialize(&receive_buffer[offset..size])
                .map_err(|e| Error::interface(format!("Malformed netlink reply: {}", e)))?;
            let length = reply.header.length as usize;

            match reply.payload {
                NetlinkPayload::Done(_) => return Ok(messages),
                NetlinkPayload::Error(err) => {
                    return Err(Error::interface(format!("Netlink dump failed: {:?}", err)));
                }
                NetlinkPayload::InnerMessage(inner) => messages.push(inner),
                _ => {}
            }

            if length == 0 {
                break;
            }
            offset += length;
        }
    }
}

fn raw_link(link: LinkMessage) -> RawLink {
    let name = link.nlas.into_iter().find_map(|nla| match nla {
        LinkNla::IfName(name) => Some(name),
        _ => None,
    });

    RawLink {
        index: link.header.index,
        name,
        up: link.header.flags & libc::IFF_UP as u32 != 0,
    }
}

fn raw_address(address: AddressMessage) -> Option<RawAddress> {
    let family = address.header.family as i32;
    if family != libc::AF_INET && family != libc::AF_INET6 {
        return None;
    }

    let mut local = None;
    let mut peer = None;
    for nla in address.nlas {
        match nla {
            AddressNla::Local(bytes) => local = Some(bytes),
            AddressNla::Address(bytes) => peer = Some(bytes),
            _ => {}
        }
    }

    Some(RawAddress {
        index: address.header.index,
        prefix_len: address.header.prefix_len,
        bytes: local.or(peer),
    })
}
