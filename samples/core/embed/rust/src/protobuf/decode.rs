use crate::{error::Error, micropython::obj::Obj};

pub struct Decoder {
    pub enums: &'static [u16],
}

impl Decoder {
    pub fn message_from_stream(&self, stream: &mut InputStream) -> Result<Obj, Error> {
        self.decode_field(stream)
    }

    pub fn decode_field(&self, stream: &mut InputStream) -> Result<Obj, Error> {
        let tag = stream.read_uvarint()?;
        Ok(tag.into())
    }
}
