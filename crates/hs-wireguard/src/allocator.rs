//! Peer address allocation
//!
//! Addresses are handed out by a monotonically increasing host offset within
//! the interface subnet. The last offset is persisted in the store under
//! `wireguard.<iface>.last_offset`. Removing a peer never rewinds the offset,
//! so an address is never handed to a second peer.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use hs_core::{ConfigStore, HsError, Result};

/// Store key holding the last allocated offset for `iface`
pub fn offset_key(iface: &str) -> String {
    format!("wireguard.{}.last_offset", iface)
}

/// Hands out unique host addresses from a subnet
#[derive(Debug, Clone)]
pub struct AddressAllocator {
    subnet: Ipv4Net,
    reserved: HashSet<Ipv4Addr>,
    last_offset: u32,
}

impl AddressAllocator {
    /// Allocator over `address`'s subnet resuming after `last_offset`
    ///
    /// The host part of `address` is the server's own address and is never
    /// handed out.
    pub fn new(address: Ipv4Net, last_offset: u32) -> Self {
        let mut reserved = HashSet::new();
        reserved.insert(address.addr());
        Self {
            subnet: address.trunc(),
            reserved,
            last_offset,
        }
    }

    /// Allocator for `iface` resuming from the offset kept in `store`
    pub fn load(store: &ConfigStore, iface: &str, address: Ipv4Net) -> Result<Self> {
        let key = offset_key(iface);
        let raw = store.get_or_default(&key, "0");
        let last_offset = raw
            .parse::<u32>()
            .map_err(|_| HsError::Serialization(format!("{} is not an offset: {:?}", key, raw)))?;
        Ok(Self::new(address, last_offset))
    }

    /// Never hand out `addr`
    pub fn reserve(&mut self, addr: Ipv4Addr) {
        self.reserved.insert(addr);
    }

    /// Builder form of [`reserve`](Self::reserve) for several addresses
    pub fn with_reserved(mut self, addrs: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        self.reserved.extend(addrs);
        self
    }

    /// Network the allocator draws from
    pub fn subnet(&self) -> Ipv4Net {
        self.subnet
    }

    /// Offset of the most recent allocation
    pub fn last_offset(&self) -> u32 {
        self.last_offset
    }

    /// Offset of the broadcast address
    fn broadcast_offset(&self) -> u64 {
        (1u64 << (32 - u32::from(self.subnet.prefix_len()))) - 1
    }

    /// Next free address
    ///
    /// Fails with [`HsError::AddressSpaceExhausted`] once the offset reaches
    /// the broadcast address. A failed call leaves the allocator unchanged.
    pub fn allocate_next(&mut self) -> Result<Ipv4Addr> {
        let broadcast = self.broadcast_offset();
        let base = u32::from(self.subnet.network());
        let mut offset = u64::from(self.last_offset);

        loop {
            offset += 1;
            if offset >= broadcast {
                return Err(HsError::AddressSpaceExhausted {
                    subnet: self.subnet.to_string(),
                });
            }
            // offset < 2^32 - 1, so the sum stays in range
            let addr = Ipv4Addr::from(base + offset as u32);
            if self.reserved.contains(&addr) {
                continue;
            }

            self.last_offset = offset as u32;
            self.reserved.insert(addr);
            return Ok(addr);
        }
    }

    /// Store key and value of the last offset for `iface`
    pub fn record(&self, iface: &str) -> (String, String) {
        (offset_key(iface), self.last_offset.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    #[test]
    fn test_skips_server_address() {
        let mut alloc = AddressAllocator::new(net("10.253.0.1/24"), 0);
        assert_eq!(alloc.allocate_next().unwrap(), Ipv4Addr::new(10, 253, 0, 2));
        assert_eq!(alloc.allocate_next().unwrap(), Ipv4Addr::new(10, 253, 0, 3));
        assert_eq!(alloc.last_offset(), 3);
    }

    #[test]
    fn test_server_in_the_middle() {
        let mut alloc = AddressAllocator::new(net("192.168.7.3/29"), 0);
        let got: Vec<_> = (0..5).map(|_| alloc.allocate_next().unwrap()).collect();
        assert_eq!(
            got,
            vec![
                Ipv4Addr::new(192, 168, 7, 1),
                Ipv4Addr::new(192, 168, 7, 2),
                Ipv4Addr::new(192, 168, 7, 4),
                Ipv4Addr::new(192, 168, 7, 5),
                Ipv4Addr::new(192, 168, 7, 6),
            ]
        );
        assert!(matches!(
            alloc.allocate_next(),
            Err(HsError::AddressSpaceExhausted { subnet }) if subnet == "192.168.7.0/29"
        ));
        // Exhaustion does not move the offset
        assert_eq!(alloc.last_offset(), 6);
    }

    #[test]
    fn test_skips_reserved_peers() {
        let mut alloc = AddressAllocator::new(net("10.0.0.1/24"), 0)
            .with_reserved([Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(10, 0, 0, 3)]);
        assert_eq!(alloc.allocate_next().unwrap(), Ipv4Addr::new(10, 0, 0, 4));
    }

    #[test]
    fn test_allocations_are_unique_and_in_range() {
        let subnet = net("172.16.8.1/26");
        let mut alloc = AddressAllocator::new(subnet, 0);
        let mut seen = HashSet::new();

        // 62 usable hosts minus the server
        for _ in 0..61 {
            let addr = alloc.allocate_next().unwrap();
            assert!(subnet.trunc().contains(&addr));
            assert_ne!(addr, subnet.network());
            assert_ne!(addr, subnet.broadcast());
            assert_ne!(addr, subnet.addr());
            assert!(seen.insert(addr));
        }
        assert!(alloc.allocate_next().is_err());
    }

    #[test]
    fn test_tiny_subnets() {
        let mut alloc = AddressAllocator::new(net("10.0.0.1/30"), 0);
        assert_eq!(alloc.allocate_next().unwrap(), Ipv4Addr::new(10, 0, 0, 2));
        assert!(alloc.allocate_next().is_err());

        assert!(AddressAllocator::new(net("10.0.0.0/31"), 0).allocate_next().is_err());
        assert!(AddressAllocator::new(net("10.0.0.0/32"), 0).allocate_next().is_err());
    }

    #[test]
    fn test_offset_persists_through_store() {
        let dir = TempDir::new().unwrap();
        let mut store = ConfigStore::open(dir.path().join("state"), dir.path().join("markers"));
        let address = net("10.253.0.1/24");

        let mut alloc = AddressAllocator::load(&store, "wg0", address).unwrap();
        alloc.allocate_next().unwrap();
        alloc.allocate_next().unwrap();
        store.set_many([alloc.record("wg0")]).unwrap();

        let mut resumed = AddressAllocator::load(&store, "wg0", address).unwrap();
        assert_eq!(resumed.allocate_next().unwrap(), Ipv4Addr::new(10, 253, 0, 4));

        store.set(&offset_key("wg0"), "garbage").unwrap();
        assert!(AddressAllocator::load(&store, "wg0", address).is_err());
    }
}
