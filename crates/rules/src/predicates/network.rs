//! IP address and CIDR predicates.
//!
//! Operands are address strings. Addresses order by their integer form
//! (IPv4 as `u32`, IPv6 as `u128`); addresses of different families are
//! incomparable. Any operand that does not parse makes every predicate in
//! this family false, `neq` and `without_network` included.

use std::cmp::Ordering;
use std::net::IpAddr;

use ipnet::IpNet;
use tenet_core::Value;

use super::Operator;

pub fn parse_addr(s: &str) -> Option<IpAddr> {
    s.trim().parse().ok()
}

pub fn parse_network(s: &str) -> Option<IpNet> {
    s.trim().parse().ok()
}

pub fn compare(a: &str, b: &str) -> Option<Ordering> {
    match (parse_addr(a)?, parse_addr(b)?) {
        (IpAddr::V4(a), IpAddr::V4(b)) => Some(u32::from(a).cmp(&u32::from(b))),
        (IpAddr::V6(a), IpAddr::V6(b)) => Some(u128::from(a).cmp(&u128::from(b))),
        _ => None,
    }
}

pub fn eq(a: &str, b: &str) -> bool {
    compare(a, b) == Some(Ordering::Equal)
}

pub fn neq(a: &str, b: &str) -> bool {
    matches!(compare(a, b), Some(Ordering::Less | Ordering::Greater))
}

pub fn lt(a: &str, b: &str) -> bool {
    compare(a, b) == Some(Ordering::Less)
}

pub fn lte(a: &str, b: &str) -> bool {
    matches!(compare(a, b), Some(Ordering::Less | Ordering::Equal))
}

pub fn gt(a: &str, b: &str) -> bool {
    compare(a, b) == Some(Ordering::Greater)
}

pub fn gte(a: &str, b: &str) -> bool {
    matches!(compare(a, b), Some(Ordering::Greater | Ordering::Equal))
}

/// Inclusive `[network, broadcast]` membership; `None` when either side
/// fails to parse.
fn membership(addr: &str, cidr: &str) -> Option<bool> {
    let addr = parse_addr(addr)?;
    let net = parse_network(cidr)?;
    Some(match (net, addr) {
        (IpNet::V4(net), IpAddr::V4(addr)) => {
            let a = u32::from(addr);
            u32::from(net.network()) <= a && a <= u32::from(net.broadcast())
        }
        (IpNet::V6(net), IpAddr::V6(addr)) => {
            let a = u128::from(addr);
            u128::from(net.network()) <= a && a <= u128::from(net.broadcast())
        }
        _ => false,
    })
}

pub fn within_network(addr: &str, cidr: &str) -> bool {
    membership(addr, cidr) == Some(true)
}

/// Not the negation of [`within_network`]: false unless both sides parse.
pub fn without_network(addr: &str, cidr: &str) -> bool {
    membership(addr, cidr) == Some(false)
}

/// Apply `op` to string operands. Anything that is not a string, and any
/// operator outside this family, is false.
pub(crate) fn apply(op: Operator, actual: &Value, expected: &Value) -> bool {
    let (Some(a), Some(b)) = (actual.as_str(), expected.as_str()) else {
        return false;
    };
    match op {
        Operator::Eq => eq(a, b),
        Operator::Neq => neq(a, b),
        Operator::Lt => lt(a, b),
        Operator::Lte => lte(a, b),
        Operator::Gt => gt(a, b),
        Operator::Gte => gte(a, b),
        Operator::WithinNetwork => within_network(a, b),
        Operator::WithoutNetwork => without_network(a, b),
        Operator::Before | Operator::NotBefore | Operator::After | Operator::NotAfter => false,
    }
}
