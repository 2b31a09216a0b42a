use alloy::primitives::Address;
use setchart_common::address::parse_address;

pub trait StringExt {
    fn parse_as_address(&self) -> crate::Result<Address>;
}

impl StringExt for str {
    fn parse_as_address(&self) -> crate::Result<Address> {
        Ok(parse_address(self)?)
    }
}

impl StringExt for String {
    fn parse_as_address(&self) -> crate::Result<Address> {
        self.as_str().parse_as_address()
    }
}
