use crate::error::NbError;

/// Source/target device on the scooter's internal bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceId {
    /// Master control of the electric scooter.
    EsControl,
    /// Bluetooth instrument of the electric scooter.
    EsBle,
    /// Built-in battery management system of the electric scooter.
    EsBatt,
    /// The PC/phone/app talking to the scooter.
    Pc,
}

impl DeviceId {
    pub const fn value(self) -> u8 {
        match self {
            DeviceId::EsControl => 0x20,
            DeviceId::EsBle => 0x21,
            DeviceId::EsBatt => 0x22,
            DeviceId::Pc => 0x3D,
        }
    }

    pub const fn from_value(v: u8) -> Option<Self> {
        match v {
            0x20 => Some(DeviceId::EsControl),
            0x21 => Some(DeviceId::EsBle),
            0x22 => Some(DeviceId::EsBatt),
            0x3D => Some(DeviceId::Pc),
            _ => None,
        }
    }
}

/// A protocol command, as carried in a [`Packet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Read control table data.
    Read,
    /// Write control table data, with reply.
    Write,
    /// Write control table data, without reply.
    WriteAckNoReply,
    /// Response packet to instruction reading.
    ReadAck,
    /// Response packet to instruction writing.
    WriteAck,
    Init,
    Ping,
    Pair,
}

impl Command {
    pub const fn value(self) -> u8 {
        match self {
            Command::Read => 0x01,
            Command::Write => 0x02,
            Command::WriteAckNoReply => 0x03,
            Command::ReadAck => 0x04,
            Command::WriteAck => 0x05,
            Command::Init => 0x5B,
            Command::Ping => 0x5C,
            Command::Pair => 0x5D,
        }
    }

    pub const fn from_value(v: u8) -> Option<Self> {
        match v {
            0x01 => Some(Command::Read),
            0x02 => Some(Command::Write),
            0x03 => Some(Command::WriteAckNoReply),
            0x04 => Some(Command::ReadAck),
            0x05 => Some(Command::WriteAck),
            0x5B => Some(Command::Init),
            0x5C => Some(Command::Ping),
            0x5D => Some(Command::Pair),
            _ => None,
        }
    }

    /// The command expected on a reply to a packet carrying `self`.
    ///
    /// Every command replies with itself except `READ`, which is answered by
    /// `READ_ACK`.
    pub const fn expected_reply(self) -> Command {
        match self {
            Command::Read => Command::ReadAck,
            other => other,
        }
    }

    /// Register-access commands (`<= 0x05`) carry a real register address in
    /// `data_index`; handshake commands use it as a protocol flag instead.
    pub const fn is_register_access(self) -> bool {
        self.value() <= 0x05
    }
}

/// The magic preamble every wire frame starts with.
pub const MAGIC: [u8; 2] = [0x5A, 0xA5];

/// Maximum payload length: `7 + data.len() <= 255`.
pub const MAX_DATA_LEN: usize = 248;

/// One protocol packet, before chunking or cipher wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub source: DeviceId,
    pub target: DeviceId,
    pub command: Command,
    pub data_index: u8,
    pub data: Vec<u8>,
}

impl Packet {
    pub fn new(source: DeviceId, target: DeviceId, command: Command, data_index: u8, data: Vec<u8>) -> Self {
        debug_assert!(data.len() <= MAX_DATA_LEN);
        debug_assert_ne!(source.value(), target.value());
        Packet {
            source,
            target,
            command,
            data_index,
            data,
        }
    }

    /// Encode this packet as a full wire frame:
    /// `[0x5A, 0xA5, len, source, target, command, data_index, data...]`.
    pub fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(7 + self.data.len());
        out.extend_from_slice(&MAGIC);
        out.push(self.data.len() as u8);
        out.push(self.source.value());
        out.push(self.target.value());
        out.push(self.command.value());
        out.push(self.data_index);
        out.extend_from_slice(&self.data);
        out
    }

    /// Decode a full wire frame. The caller must already have stripped any
    /// cipher wrapping.
    pub fn unpack(data: &[u8]) -> Result<Packet, NbError> {
        if data.len() < 7 {
            return Err(NbError::Framing("frame shorter than 7 bytes"));
        }
        if data[0..2] != MAGIC {
            return Err(NbError::Framing("bad preamble"));
        }
        let len = data[2] as usize;
        if data.len() < 7 + len {
            return Err(NbError::Framing("truncated payload"));
        }
        let source = DeviceId::from_value(data[3]).ok_or(NbError::Framing("unknown source device id"))?;
        let target = DeviceId::from_value(data[4]).ok_or(NbError::Framing("unknown target device id"))?;
        let command = Command::from_value(data[5]).ok_or(NbError::Framing("unknown command"))?;
        let data_index = data[6];
        let payload = data[7..7 + len].to_vec();
        Ok(Packet::new(source, target, command, data_index, payload))
    }

    /// `true` iff `reply` is the matching response to a request packet
    /// described by `self`, per the engine's match rule: same bus pair
    /// reversed, expected reply command, and (for register-access commands
    /// only) the same `data_index`.
    pub fn matches_reply(&self, reply: &Packet) -> bool {
        reply.source.value() == self.target.value()
            && reply.target.value() == self.source.value()
            && reply.command == self.command.expected_reply()
            && (!self.command.is_register_access() || reply.data_index == self.data_index)
    }
}

#[test]
fn roundtrip_empty_payload() {
    let p = Packet::new(DeviceId::Pc, DeviceId::EsBle, Command::Init, 0, vec![]);
    assert_eq!(Packet::unpack(&p.pack()).unwrap(), p);
}

#[test]
fn roundtrip_max_payload() {
    let data = vec![0xAB; MAX_DATA_LEN];
    let p = Packet::new(DeviceId::Pc, DeviceId::EsControl, Command::Write, 0x42, data);
    assert_eq!(Packet::unpack(&p.pack()).unwrap(), p);
}

#[test]
fn roundtrip_various_lengths() {
    for len in 0..=MAX_DATA_LEN {
        let data = vec![(len % 256) as u8; len];
        let p = Packet::new(DeviceId::Pc, DeviceId::EsBatt, Command::Read, 0x10, data);
        assert_eq!(Packet::unpack(&p.pack()).unwrap(), p);
    }
}

#[test]
fn reject_too_short() {
    let err = Packet::unpack(&[0x5A, 0xA5, 0x00, 0x3D, 0x20]).unwrap_err();
    assert!(matches!(err, NbError::Framing(_)));
}

#[test]
fn reject_bad_preamble() {
    let bytes = [0xFF, 0xFF, 0x00, 0x3D, 0x20, 0x01, 0x00];
    let err = Packet::unpack(&bytes).unwrap_err();
    assert!(matches!(err, NbError::Framing(_)));
}

#[test]
fn reject_truncated_payload() {
    // claims 5 bytes of payload but only carries 2
    let bytes = [0x5A, 0xA5, 0x05, 0x3D, 0x20, 0x01, 0x00, 0x01, 0x02];
    let err = Packet::unpack(&bytes).unwrap_err();
    assert!(matches!(err, NbError::Framing(_)));
}

#[test]
fn reject_unknown_enum_value() {
    let bytes = [0x5A, 0xA5, 0x00, 0x3D, 0x20, 0xEE, 0x00];
    let err = Packet::unpack(&bytes).unwrap_err();
    assert!(matches!(err, NbError::Framing(_)));
}

#[test]
fn match_rule_read_ack_requires_same_index() {
    let req = Packet::new(DeviceId::Pc, DeviceId::EsControl, Command::Read, 0x1A, vec![2]);
    let good = Packet::new(DeviceId::EsControl, DeviceId::Pc, Command::ReadAck, 0x1A, vec![1, 2]);
    let bad = Packet::new(DeviceId::EsControl, DeviceId::Pc, Command::ReadAck, 0x1B, vec![1, 2]);
    assert!(req.matches_reply(&good));
    assert!(!req.matches_reply(&bad));
}

#[test]
fn match_rule_handshake_ignores_data_index() {
    let req = Packet::new(DeviceId::Pc, DeviceId::EsBle, Command::Init, 0, vec![]);
    let reply = Packet::new(DeviceId::EsBle, DeviceId::Pc, Command::Init, 7, vec![0; 20]);
    assert!(req.matches_reply(&reply));
}
