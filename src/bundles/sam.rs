//! SAM record flag functions.
//!
//! Each function takes the integer FLAG field of a SAM alignment record and returns 1 if the
//! named bit is set, otherwise 0. Only the low 16 bits of the argument are read.
use crate::{types::*, value::Value};
use bitflags::bitflags;

bitflags! {
    /// The bits of a SAM record's FLAG field.
    pub struct Flags: u16 {
        const SEGMENTED = 0x1;
        const PROPERLY_ALIGNED = 0x2;
        const UNMAPPED = 0x4;
        const MATE_UNMAPPED = 0x8;
        const REVERSE_COMPLEMENTED = 0x10;
        const MATE_REVERSE_COMPLEMENTED = 0x20;
        const FIRST_SEGMENT = 0x40;
        const LAST_SEGMENT = 0x80;
        const SECONDARY = 0x100;
        const QC_FAIL = 0x200;
        const DUPLICATE = 0x400;
        const SUPPLEMENTARY = 0x800;
    }
}

fn flags(args: &[Value]) -> Result<Flags> {
    match args.first() {
        Some(Value::Integer(x)) => Ok(Flags::from_bits_truncate(*x as u16)),
        Some(x) => Err(Error::invalid_input(format!(
            "flag must be an integer, found {}",
            x.value_type()
        ))),
        None => Err(Error::invalid_input("missing flag argument")),
    }
}

macro_rules! flag_functions {
    ($($name:ident => $flag:ident),* $(,)?) => {
        $(
            pub fn $name(args: &[Value]) -> Result<Value> {
                Ok(Value::Integer(flags(args)?.contains(Flags::$flag) as i64))
            }
        )*

        pub(super) fn resolve(symbol: &str) -> Option<fn(&[Value]) -> Result<Value>> {
            Some(match symbol {
                $(stringify!($name) => $name,)*
                _ => return None,
            })
        }
    };
}

flag_functions! {
    is_segmented => SEGMENTED,
    is_properly_aligned => PROPERLY_ALIGNED,
    is_unmapped => UNMAPPED,
    is_mate_unmapped => MATE_UNMAPPED,
    is_reverse_complemented => REVERSE_COMPLEMENTED,
    is_mate_reverse_complemented => MATE_REVERSE_COMPLEMENTED,
    is_first_segment => FIRST_SEGMENT,
    is_last_segment => LAST_SEGMENT,
    is_secondary => SECONDARY,
    is_quality_control_failed => QC_FAIL,
    is_duplicate => DUPLICATE,
    is_supplementary => SUPPLEMENTARY,
}
