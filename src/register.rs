//! The register catalog: a declarative table of addresses, widths,
//! decoders, scalers and units for both the controller and BMS address
//! spaces.

use crate::error::NbError;
use crate::packet::DeviceId;

/// Controller (`ES_CONTROL`) register addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtrlReg {
    NbInfSn,
    NbInfBtPassword,
    NbFwVer,
    NbInfError,
    NbInfAlarm,
    NbInfBoolLimitSpeed,
    NbInfBoolLock,
    NbInfBoolBeep,
    NbInfBoolBat2In,
    NbInfBoolAct,
    NbInfActualMil,
    NbInfPrdRidMil,
    NbInfRidMil,
    NbInfRunTim,
    NbInfRidTim,
    NbInfBodyTemp,
    NbInfDrvVolt,
    NbInfAvrSpeed,
    NbInfVerBms2,
    NbInfVerBle,
    NbCtlLimitSpd,
    NbCtlNormalSpeed,
    NbCtlLitSpeed,
    NbCtlWorkMode,
    NbCtlKers,
    NbCtlCruise,
    NbCtlTailLight,
    NbSingleMil,
    /// Shares register 0xBA with [`CtrlReg::NbPower`]. Looks like a
    /// copy-paste error in the scooter's own firmware table; both entries
    /// are kept addressable rather than silently picking one. They return
    /// the same raw bytes and differ only by scaler/unit.
    NbSingleRunTim,
    NbPower,
}

/// BMS (`ES_BATT`) register addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BmsReg {
    BatSn,
    BatSwVer,
    BatCapacity,
    BatOverflowTimes,
    BatOverdischargeTimes,
    BatRemainingCap,
    BatRemainingCapPercent,
    BatCurrentCur,
    BatVoltageCur,
    BatTempCur1,
    BatTempCur2,
    BatBalanceStatus,
    BatOdisState,
    BatOchgState,
    BatHealthy,
}

/// A register address in either the controller or BMS address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterId {
    Ctrl(CtrlReg),
    Bms(BmsReg),
}

impl From<CtrlReg> for RegisterId {
    fn from(r: CtrlReg) -> Self {
        RegisterId::Ctrl(r)
    }
}

impl From<BmsReg> for RegisterId {
    fn from(r: BmsReg) -> Self {
        RegisterId::Bms(r)
    }
}

/// The target device a register address lives on.
pub fn target(id: RegisterId) -> DeviceId {
    match id {
        RegisterId::Ctrl(_) => DeviceId::EsControl,
        RegisterId::Bms(_) => DeviceId::EsBatt,
    }
}

/// Operating mode, decoded from `NB_CTL_WORKMODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    Normal = 0,
    Eco = 1,
    Sport = 2,
}

/// Regenerative braking strength, decoded from `NB_CTL_KERS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KersLevel {
    Off = 0,
    Medium = 1,
    Strong = 2,
}

/// Semantic category of a register's value, for downstream formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Distance,
    Duration,
    Temperature,
    Voltage,
    Current,
    Battery,
}

/// Unit tag for downstream formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    LengthKilometers,
    TimeHours,
    TempCelsius,
    ElectricPotentialVolt,
    ElectricCurrentAmpere,
    SpeedKilometersPerHour,
    Percentage,
    PowerWatt,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::LengthKilometers => "km",
            Unit::TimeHours => "h",
            Unit::TempCelsius => "°C",
            Unit::ElectricPotentialVolt => "V",
            Unit::ElectricCurrentAmpere => "A",
            Unit::SpeedKilometersPerHour => "km/h",
            Unit::Percentage => "%",
            Unit::PowerWatt => "W",
        }
    }
}

/// A decoded (and, if applicable, scaled) register value.
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterValue {
    Text(String),
    U16(u16),
    I16(i16),
    U32(u32),
    F64(f64),
    Bool(bool),
    OpMode(OperationMode),
    Kers(KersLevel),
}

impl std::fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterValue::Text(s) => write!(f, "{s}"),
            RegisterValue::U16(v) => write!(f, "{v}"),
            RegisterValue::I16(v) => write!(f, "{v}"),
            RegisterValue::U32(v) => write!(f, "{v}"),
            RegisterValue::F64(v) => write!(f, "{v}"),
            RegisterValue::Bool(v) => write!(f, "{v}"),
            RegisterValue::OpMode(v) => write!(f, "{v:?}"),
            RegisterValue::Kers(v) => write!(f, "{v:?}"),
        }
    }
}

type Decoder = Box<dyn Fn(&[u8]) -> Result<RegisterValue, NbError> + Send + Sync>;
type Scaler = Box<dyn Fn(RegisterValue) -> RegisterValue + Send + Sync>;

/// Immutable catalog entry: address, width and pure decode/scale functions.
pub struct RegisterDescriptor {
    pub index_start: u8,
    pub index_len: u8,
    pub read_len: u8,
    pub decode: Decoder,
    pub scale: Option<Scaler>,
    pub unit: Option<Unit>,
    pub device_class: Option<DeviceClass>,
}

impl RegisterDescriptor {
    /// Apply `decode` and then, if present, `scale` to the raw bytes
    /// accumulated across `index_len` reads.
    pub fn resolve(&self, raw: &[u8]) -> Result<RegisterValue, NbError> {
        let decoded = (self.decode)(raw)?;
        Ok(match &self.scale {
            Some(scale) => scale(decoded),
            None => decoded,
        })
    }
}

// --- decoders --------------------------------------------------------

fn decode_string(data: &[u8]) -> Result<RegisterValue, NbError> {
    String::from_utf8(data.to_vec())
        .map(RegisterValue::Text)
        .map_err(|e| NbError::Decode(format!("invalid utf-8 in string register: {e}")))
}

fn decode_hex(data: &[u8]) -> Result<RegisterValue, NbError> {
    Ok(RegisterValue::Text(hex::encode_upper(data)))
}

fn require_len(data: &[u8], expected: usize) -> Result<(), NbError> {
    if data.len() != expected {
        return Err(NbError::Decode(format!("expected {expected} bytes, got {}", data.len())));
    }
    Ok(())
}

pub fn decode_u16_le(data: &[u8]) -> Result<RegisterValue, NbError> {
    require_len(data, 2)?;
    Ok(RegisterValue::U16(u16::from_le_bytes([data[0], data[1]])))
}

pub fn decode_s16_le(data: &[u8]) -> Result<RegisterValue, NbError> {
    require_len(data, 2)?;
    Ok(RegisterValue::I16(i16::from_le_bytes([data[0], data[1]])))
}

pub fn decode_u32_from_two_u16_le(data: &[u8]) -> Result<RegisterValue, NbError> {
    require_len(data, 4)?;
    let low = u16::from_le_bytes([data[0], data[1]]) as u32;
    let high = u16::from_le_bytes([data[2], data[3]]) as u32;
    Ok(RegisterValue::U32(low | (high << 16)))
}

pub fn decode_version(data: &[u8]) -> Result<RegisterValue, NbError> {
    require_len(data, 2)?;
    let v = u16::from_le_bytes([data[0], data[1]]);
    Ok(RegisterValue::Text(format!("{}.{}.{}", v >> 8, (v >> 4) & 0xF, v & 0xF)))
}

pub fn decode_bitfield_bool(data: &[u8], pos: u32) -> Result<RegisterValue, NbError> {
    require_len(data, 2)?;
    let word = u16::from_le_bytes([data[0], data[1]]);
    Ok(RegisterValue::Bool((word & (1 << pos)) > 0))
}

fn decode_op_mode(data: &[u8]) -> Result<RegisterValue, NbError> {
    require_len(data, 2)?;
    let v = u16::from_le_bytes([data[0], data[1]]);
    let mode = match v {
        0 => OperationMode::Normal,
        1 => OperationMode::Eco,
        2 => OperationMode::Sport,
        other => return Err(NbError::Decode(format!("unknown operation mode {other}"))),
    };
    Ok(RegisterValue::OpMode(mode))
}

fn decode_kers_level(data: &[u8]) -> Result<RegisterValue, NbError> {
    require_len(data, 2)?;
    let v = u16::from_le_bytes([data[0], data[1]]);
    let level = match v {
        0 => KersLevel::Off,
        1 => KersLevel::Medium,
        2 => KersLevel::Strong,
        other => return Err(NbError::Decode(format!("unknown KERS level {other}"))),
    };
    Ok(RegisterValue::Kers(level))
}

// --- scalers -----------------------------------------------------------

fn as_f64(v: &RegisterValue) -> f64 {
    match *v {
        RegisterValue::U16(x) => x as f64,
        RegisterValue::I16(x) => x as f64,
        RegisterValue::U32(x) => x as f64,
        RegisterValue::F64(x) => x,
        _ => 0.0,
    }
}

fn scale_div(divisor: f64) -> Scaler {
    Box::new(move |v| RegisterValue::F64(as_f64(&v) / divisor))
}

fn scale_div_round1(divisor: f64) -> Scaler {
    Box::new(move |v| RegisterValue::F64((as_f64(&v) / divisor * 10.0).round() / 10.0))
}

fn scale_low_byte() -> Scaler {
    Box::new(|v| RegisterValue::U16((as_f64(&v) as u32 & 0xFF) as u16))
}

fn scale_high_byte() -> Scaler {
    Box::new(|v| RegisterValue::U16(((as_f64(&v) as u32 >> 8) & 0xFF) as u16))
}

fn scale_temp_low_byte() -> Scaler {
    Box::new(|v| RegisterValue::F64(((as_f64(&v) as i64 & 0xFF) - 20) as f64))
}

fn scale_temp_high_byte() -> Scaler {
    Box::new(|v| RegisterValue::F64((((as_f64(&v) as i64 >> 8) & 0xFF) - 20) as f64))
}

// --- catalog -------------------------------------------------------------

/// Look up the catalog entry for a register address.
pub fn descriptor(id: RegisterId) -> RegisterDescriptor {
    match id {
        RegisterId::Ctrl(r) => ctrl_descriptor(r),
        RegisterId::Bms(r) => bms_descriptor(r),
    }
}

fn ctrl_descriptor(reg: CtrlReg) -> RegisterDescriptor {
    use CtrlReg::*;
    match reg {
        NbInfSn => RegisterDescriptor {
            index_start: 0x10,
            index_len: 7,
            read_len: 2,
            decode: Box::new(decode_string),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbInfBtPassword => RegisterDescriptor {
            index_start: 0x17,
            index_len: 3,
            read_len: 2,
            decode: Box::new(decode_string),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbFwVer => RegisterDescriptor {
            index_start: 0x1A,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_version),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbInfError => RegisterDescriptor {
            index_start: 0x1B,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbInfAlarm => RegisterDescriptor {
            index_start: 0x1C,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbInfBoolLimitSpeed => RegisterDescriptor {
            index_start: 0x1D,
            index_len: 1,
            read_len: 2,
            decode: Box::new(|d| decode_bitfield_bool(d, 0)),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbInfBoolLock => RegisterDescriptor {
            index_start: 0x1D,
            index_len: 1,
            read_len: 2,
            decode: Box::new(|d| decode_bitfield_bool(d, 1)),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbInfBoolBeep => RegisterDescriptor {
            index_start: 0x1D,
            index_len: 1,
            read_len: 2,
            decode: Box::new(|d| decode_bitfield_bool(d, 2)),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbInfBoolBat2In => RegisterDescriptor {
            index_start: 0x1D,
            index_len: 1,
            read_len: 2,
            decode: Box::new(|d| decode_bitfield_bool(d, 9)),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbInfBoolAct => RegisterDescriptor {
            index_start: 0x1D,
            index_len: 1,
            read_len: 2,
            decode: Box::new(|d| decode_bitfield_bool(d, 11)),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbInfActualMil => RegisterDescriptor {
            index_start: 0x24,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_div(100.0)),
            unit: Some(Unit::LengthKilometers),
            device_class: Some(DeviceClass::Distance),
        },
        NbInfPrdRidMil => RegisterDescriptor {
            index_start: 0x25,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_div(100.0)),
            unit: Some(Unit::LengthKilometers),
            device_class: Some(DeviceClass::Distance),
        },
        NbInfRidMil => RegisterDescriptor {
            index_start: 0x29,
            index_len: 2,
            read_len: 2,
            decode: Box::new(decode_u32_from_two_u16_le),
            scale: Some(scale_div_round1(1000.0)),
            unit: Some(Unit::LengthKilometers),
            device_class: Some(DeviceClass::Distance),
        },
        NbInfRunTim => RegisterDescriptor {
            index_start: 0x32,
            index_len: 2,
            read_len: 2,
            decode: Box::new(decode_u32_from_two_u16_le),
            scale: Some(scale_div_round1(1000.0)),
            unit: Some(Unit::TimeHours),
            device_class: Some(DeviceClass::Duration),
        },
        NbInfRidTim => RegisterDescriptor {
            index_start: 0x34,
            index_len: 2,
            read_len: 2,
            decode: Box::new(decode_u32_from_two_u16_le),
            scale: Some(scale_div_round1(3600.0)),
            unit: Some(Unit::TimeHours),
            device_class: Some(DeviceClass::Duration),
        },
        NbInfBodyTemp => RegisterDescriptor {
            index_start: 0x3E,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_div(10.0)),
            unit: Some(Unit::TempCelsius),
            device_class: Some(DeviceClass::Temperature),
        },
        NbInfDrvVolt => RegisterDescriptor {
            index_start: 0x47,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_div(100.0)),
            unit: Some(Unit::ElectricPotentialVolt),
            device_class: Some(DeviceClass::Voltage),
        },
        NbInfAvrSpeed => RegisterDescriptor {
            index_start: 0x65,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_div(10.0)),
            unit: Some(Unit::SpeedKilometersPerHour),
            device_class: None,
        },
        NbInfVerBms2 => RegisterDescriptor {
            index_start: 0x66,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbInfVerBle => RegisterDescriptor {
            index_start: 0x68,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_version),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbCtlLimitSpd => RegisterDescriptor {
            index_start: 0x72,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_s16_le),
            scale: Some(scale_div(10.0)),
            unit: Some(Unit::SpeedKilometersPerHour),
            device_class: None,
        },
        NbCtlNormalSpeed => RegisterDescriptor {
            index_start: 0x73,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_s16_le),
            scale: Some(scale_div(10.0)),
            unit: Some(Unit::SpeedKilometersPerHour),
            device_class: None,
        },
        NbCtlLitSpeed => RegisterDescriptor {
            index_start: 0x74,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_s16_le),
            scale: Some(scale_div(10.0)),
            unit: Some(Unit::SpeedKilometersPerHour),
            device_class: None,
        },
        NbCtlWorkMode => RegisterDescriptor {
            index_start: 0x75,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_op_mode),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbCtlKers => RegisterDescriptor {
            index_start: 0x7B,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_kers_level),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbCtlCruise => RegisterDescriptor {
            index_start: 0x7C,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbCtlTailLight => RegisterDescriptor {
            index_start: 0x7D,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        NbSingleMil => RegisterDescriptor {
            index_start: 0xB9,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_div(100.0)),
            unit: Some(Unit::LengthKilometers),
            device_class: Some(DeviceClass::Distance),
        },
        NbSingleRunTim => RegisterDescriptor {
            index_start: 0xBA,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_div_round1(3600.0)),
            unit: Some(Unit::TimeHours),
            device_class: Some(DeviceClass::Duration),
        },
        NbPower => RegisterDescriptor {
            index_start: 0xBA,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: Some(Unit::PowerWatt),
            device_class: None,
        },
    }
}

fn bms_descriptor(reg: BmsReg) -> RegisterDescriptor {
    use BmsReg::*;
    match reg {
        BatSn => RegisterDescriptor {
            index_start: 0x10,
            index_len: 7,
            read_len: 2,
            decode: Box::new(decode_hex),
            scale: None,
            unit: None,
            device_class: None,
        },
        BatSwVer => RegisterDescriptor {
            index_start: 0x17,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        BatCapacity => RegisterDescriptor {
            index_start: 0x18,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        BatOverflowTimes => RegisterDescriptor {
            index_start: 0x1F,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_low_byte()),
            unit: None,
            device_class: None,
        },
        BatOverdischargeTimes => RegisterDescriptor {
            index_start: 0x1F,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_high_byte()),
            unit: None,
            device_class: None,
        },
        BatRemainingCap => RegisterDescriptor {
            index_start: 0x31,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        BatRemainingCapPercent => RegisterDescriptor {
            index_start: 0x32,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: Some(Unit::Percentage),
            device_class: Some(DeviceClass::Battery),
        },
        BatCurrentCur => RegisterDescriptor {
            index_start: 0x33,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_s16_le),
            scale: Some(scale_div(100.0)),
            unit: Some(Unit::ElectricCurrentAmpere),
            device_class: None,
        },
        BatVoltageCur => RegisterDescriptor {
            index_start: 0x34,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_div(100.0)),
            unit: Some(Unit::ElectricPotentialVolt),
            device_class: None,
        },
        BatTempCur1 => RegisterDescriptor {
            index_start: 0x35,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_temp_low_byte()),
            unit: Some(Unit::TempCelsius),
            device_class: None,
        },
        BatTempCur2 => RegisterDescriptor {
            index_start: 0x35,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: Some(scale_temp_high_byte()),
            unit: Some(Unit::TempCelsius),
            device_class: None,
        },
        BatBalanceStatus => RegisterDescriptor {
            index_start: 0x36,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        BatOdisState => RegisterDescriptor {
            index_start: 0x37,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        BatOchgState => RegisterDescriptor {
            index_start: 0x38,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: None,
            device_class: None,
        },
        BatHealthy => RegisterDescriptor {
            index_start: 0x3B,
            index_len: 1,
            read_len: 2,
            decode: Box::new(decode_u16_le),
            scale: None,
            unit: Some(Unit::Percentage),
            device_class: None,
        },
    }
}

/// Every catalog entry paired with its kebab-case CLI name (e.g.
/// `"nb-fw-ver"`, `"bat-sn"`), for the CLI front-end's `--register` flag and
/// its no-args "dump everything" mode.
pub fn catalog_names() -> Vec<(&'static str, RegisterId)> {
    use BmsReg::*;
    use CtrlReg::*;
    vec![
        ("nb-inf-sn", RegisterId::Ctrl(NbInfSn)),
        ("nb-inf-bt-password", RegisterId::Ctrl(NbInfBtPassword)),
        ("nb-fw-ver", RegisterId::Ctrl(NbFwVer)),
        ("nb-inf-error", RegisterId::Ctrl(NbInfError)),
        ("nb-inf-alarm", RegisterId::Ctrl(NbInfAlarm)),
        ("nb-inf-bool-limit-speed", RegisterId::Ctrl(NbInfBoolLimitSpeed)),
        ("nb-inf-bool-lock", RegisterId::Ctrl(NbInfBoolLock)),
        ("nb-inf-bool-beep", RegisterId::Ctrl(NbInfBoolBeep)),
        ("nb-inf-bool-bat2-in", RegisterId::Ctrl(NbInfBoolBat2In)),
        ("nb-inf-bool-act", RegisterId::Ctrl(NbInfBoolAct)),
        ("nb-inf-actual-mil", RegisterId::Ctrl(NbInfActualMil)),
        ("nb-inf-prd-rid-mil", RegisterId::Ctrl(NbInfPrdRidMil)),
        ("nb-inf-rid-mil", RegisterId::Ctrl(NbInfRidMil)),
        ("nb-inf-run-tim", RegisterId::Ctrl(NbInfRunTim)),
        ("nb-inf-rid-tim", RegisterId::Ctrl(NbInfRidTim)),
        ("nb-inf-body-temp", RegisterId::Ctrl(NbInfBodyTemp)),
        ("nb-inf-drv-volt", RegisterId::Ctrl(NbInfDrvVolt)),
        ("nb-inf-avr-speed", RegisterId::Ctrl(NbInfAvrSpeed)),
        ("nb-inf-ver-bms2", RegisterId::Ctrl(NbInfVerBms2)),
        ("nb-inf-ver-ble", RegisterId::Ctrl(NbInfVerBle)),
        ("nb-ctl-limit-spd", RegisterId::Ctrl(NbCtlLimitSpd)),
        ("nb-ctl-normal-speed", RegisterId::Ctrl(NbCtlNormalSpeed)),
        ("nb-ctl-lit-speed", RegisterId::Ctrl(NbCtlLitSpeed)),
        ("nb-ctl-work-mode", RegisterId::Ctrl(NbCtlWorkMode)),
        ("nb-ctl-kers", RegisterId::Ctrl(NbCtlKers)),
        ("nb-ctl-cruise", RegisterId::Ctrl(NbCtlCruise)),
        ("nb-ctl-tail-light", RegisterId::Ctrl(NbCtlTailLight)),
        ("nb-single-mil", RegisterId::Ctrl(NbSingleMil)),
        ("nb-single-run-tim", RegisterId::Ctrl(NbSingleRunTim)),
        ("nb-power", RegisterId::Ctrl(NbPower)),
        ("bat-sn", RegisterId::Bms(BatSn)),
        ("bat-sw-ver", RegisterId::Bms(BatSwVer)),
        ("bat-capacity", RegisterId::Bms(BatCapacity)),
        ("bat-overflow-times", RegisterId::Bms(BatOverflowTimes)),
        ("bat-overdischarge-times", RegisterId::Bms(BatOverdischargeTimes)),
        ("bat-remaining-cap", RegisterId::Bms(BatRemainingCap)),
        ("bat-remaining-cap-percent", RegisterId::Bms(BatRemainingCapPercent)),
        ("bat-current-cur", RegisterId::Bms(BatCurrentCur)),
        ("bat-voltage-cur", RegisterId::Bms(BatVoltageCur)),
        ("bat-temp-cur1", RegisterId::Bms(BatTempCur1)),
        ("bat-temp-cur2", RegisterId::Bms(BatTempCur2)),
        ("bat-balance-status", RegisterId::Bms(BatBalanceStatus)),
        ("bat-odis-state", RegisterId::Bms(BatOdisState)),
        ("bat-ochg-state", RegisterId::Bms(BatOchgState)),
        ("bat-healthy", RegisterId::Bms(BatHealthy)),
    ]
}

/// Look up a register by its CLI name (see [`catalog_names`]).
pub fn by_name(name: &str) -> Option<RegisterId> {
    catalog_names().into_iter().find(|(n, _)| *n == name).map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_le_law() {
        assert_eq!(decode_u16_le(&[0x34, 0x12]).unwrap(), RegisterValue::U16(0x1234));
    }

    #[test]
    fn s16_le_law() {
        assert_eq!(decode_s16_le(&[0xFF, 0xFF]).unwrap(), RegisterValue::I16(-1));
    }

    #[test]
    fn u32_from_two_u16_le_law() {
        assert_eq!(
            decode_u32_from_two_u16_le(&[0x01, 0x00, 0x00, 0x80]).unwrap(),
            RegisterValue::U32(0x80000001)
        );
    }

    #[test]
    fn version_law() {
        assert_eq!(decode_version(&[0x34, 0x12]).unwrap(), RegisterValue::Text("18.3.4".into()));
    }

    #[test]
    fn bitfield_bool_law() {
        assert_eq!(decode_bitfield_bool(&[0x04, 0x00], 2).unwrap(), RegisterValue::Bool(true));
        assert_eq!(decode_bitfield_bool(&[0x04, 0x00], 0).unwrap(), RegisterValue::Bool(false));
    }

    #[test]
    fn temperature_scalers_split_channels() {
        let word = decode_u16_le(&[0x28, 0x29]).unwrap(); // LE 0x2928
        let ch1 = scale_temp_low_byte()(word.clone());
        let ch2 = scale_temp_high_byte()(word);
        assert_eq!(ch1, RegisterValue::F64(20.0));
        assert_eq!(ch2, RegisterValue::F64(21.0));
    }

    #[test]
    fn firmware_version_end_to_end() {
        let desc = descriptor(RegisterId::Ctrl(CtrlReg::NbFwVer));
        assert_eq!(desc.index_start, 0x1A);
        assert_eq!(desc.index_len, 1);
        let value = desc.resolve(&[0x34, 0x12]).unwrap();
        assert_eq!(value, RegisterValue::Text("18.3.4".into()));
    }

    #[test]
    fn total_mileage_scaled_to_one_decimal_km() {
        let desc = descriptor(RegisterId::Ctrl(CtrlReg::NbInfRidMil));
        let raw = [0xE8, 0x03, 0x00, 0x00]; // low=1000, high=0 -> 1000 -> /1000 -> 1.0
        let value = desc.resolve(&raw).unwrap();
        assert_eq!(value, RegisterValue::F64(1.0));
    }

    #[test]
    fn power_and_single_run_time_share_register_but_differ_in_meaning() {
        let power = descriptor(RegisterId::Ctrl(CtrlReg::NbPower));
        let runtime = descriptor(RegisterId::Ctrl(CtrlReg::NbSingleRunTim));
        assert_eq!(power.index_start, 0xBA);
        assert_eq!(runtime.index_start, 0xBA);
        assert_eq!(power.unit, Some(Unit::PowerWatt));
        assert_eq!(runtime.unit, Some(Unit::TimeHours));

        let raw = [0x10, 0x0E]; // LE 0x0E10 = 3600
        assert_eq!(power.resolve(&raw).unwrap(), RegisterValue::U16(3600));
        assert_eq!(runtime.resolve(&raw).unwrap(), RegisterValue::F64(1.0));
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let err = decode_u16_le(&[0x01]).unwrap_err();
        assert!(matches!(err, NbError::Decode(_)));
    }

    #[test]
    fn target_partitions_by_address_space() {
        assert_eq!(target(RegisterId::Ctrl(CtrlReg::NbFwVer)), DeviceId::EsControl);
        assert_eq!(target(RegisterId::Bms(BmsReg::BatSn)), DeviceId::EsBatt);
    }

    #[test]
    fn by_name_resolves_every_catalog_entry() {
        for (name, id) in catalog_names() {
            assert_eq!(by_name(name), Some(id));
        }
        assert_eq!(by_name("does-not-exist"), None);
    }
}
