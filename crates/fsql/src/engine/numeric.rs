//! Exact decoding of PostgreSQL `numeric` values.
//!
//! The binary wire format is a header of four 16-bit fields (digit count, weight,
//! sign, display scale) followed by base-10000 digit groups. Group `i` is worth
//! `digit * 10000^(weight - i)`.

use crate::error::{FsqlError, FsqlResult};
use serde_json::Value;
use std::error::Error;
use tokio_postgres::types::{FromSql, Type};

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

const GROUP_BASE: i16 = 10_000;
const GROUP_DIGITS: usize = 4;

/// A `numeric` value as plain decimal text, the way PostgreSQL prints it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NumericText(pub(crate) String);

impl NumericText {
    /// Convert to a JSON number, keeping every digit.
    pub(crate) fn into_value(self, column: &str) -> FsqlResult<Value> {
        serde_json::from_str::<Value>(&self.0)
            .ok()
            .filter(Value::is_number)
            .ok_or_else(|| FsqlError::decode(column, format!("{} is not a JSON number", self.0)))
    }
}

fn read_u16(raw: &[u8], pos: usize) -> Result<u16, Box<dyn Error + Sync + Send>> {
    raw.get(pos..pos + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| "truncated numeric data".into())
}

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let ndigits = usize::from(read_u16(raw, 0)?);
        let weight = i64::from(read_u16(raw, 2)? as i16);
        let sign = read_u16(raw, 4)?;
        let dscale = usize::from(read_u16(raw, 6)?);

        let negative = match sign {
            NUMERIC_POS => false,
            NUMERIC_NEG => true,
            NUMERIC_NAN => return Err("NaN has no JSON representation".into()),
            NUMERIC_PINF | NUMERIC_NINF => {
                return Err("infinity has no JSON representation".into());
            }
            other => return Err(format!("invalid numeric sign 0x{other:04x}").into()),
        };

        let mut groups = Vec::with_capacity(ndigits);
        for i in 0..ndigits {
            let group = read_u16(raw, 8 + i * 2)? as i16;
            if !(0..GROUP_BASE).contains(&group) {
                return Err(format!("invalid numeric digit group {group}").into());
            }
            groups.push(group);
        }
        let group_at = |index: i64| -> i16 {
            usize::try_from(index)
                .ok()
                .and_then(|i| groups.get(i).copied())
                .unwrap_or(0)
        };

        let mut out = String::new();
        if negative {
            out.push('-');
        }

        if weight < 0 {
            out.push('0');
        } else {
            out.push_str(&group_at(0).to_string());
            for index in 1..=weight {
                out.push_str(&format!("{:04}", group_at(index)));
            }
        }

        if dscale > 0 {
            let mut frac = String::with_capacity(dscale + GROUP_DIGITS);
            let mut index = weight + 1;
            while frac.len() < dscale {
                frac.push_str(&format!("{:04}", group_at(index)));
                index += 1;
            }
            frac.truncate(dscale);
            out.push('.');
            out.push_str(&frac);
        }

        Ok(NumericText(out))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(weight: i16, sign: u16, dscale: u16, groups: &[i16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&(groups.len() as u16).to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for g in groups {
            raw.extend_from_slice(&g.to_be_bytes());
        }
        raw
    }

    fn decode(raw: &[u8]) -> String {
        NumericText::from_sql(&Type::NUMERIC, raw).unwrap().0
    }

    #[test]
    fn integers_and_fractions() {
        assert_eq!(decode(&encode(1, NUMERIC_POS, 3, &[1, 2345, 6780])), "12345.678");
        assert_eq!(decode(&encode(0, NUMERIC_NEG, 0, &[5])), "-5");
        assert_eq!(decode(&encode(2, NUMERIC_POS, 0, &[12])), "1200000000");
    }

    #[test]
    fn small_fractions_and_zero() {
        assert_eq!(decode(&encode(-1, NUMERIC_POS, 4, &[12])), "0.0012");
        assert_eq!(decode(&encode(-2, NUMERIC_POS, 6, &[500])), "0.000005");
        assert_eq!(decode(&encode(0, NUMERIC_POS, 2, &[])), "0.00");
        assert_eq!(decode(&encode(0, NUMERIC_POS, 0, &[])), "0");
    }

    #[test]
    fn scale_pads_trailing_zeros() {
        assert_eq!(decode(&encode(0, NUMERIC_POS, 5, &[3, 1400])), "3.14000");
    }

    #[test]
    fn special_values_are_rejected() {
        for sign in [NUMERIC_NAN, NUMERIC_PINF, NUMERIC_NINF] {
            assert!(NumericText::from_sql(&Type::NUMERIC, &encode(0, sign, 0, &[])).is_err());
        }
    }

    #[test]
    fn malformed_data_is_rejected() {
        assert!(NumericText::from_sql(&Type::NUMERIC, &[0, 1, 0]).is_err());
        let out_of_range = encode(0, NUMERIC_POS, 0, &[10_000]);
        assert!(NumericText::from_sql(&Type::NUMERIC, &out_of_range).is_err());
        let bad_sign = encode(0, 0x1234, 0, &[1]);
        assert!(NumericText::from_sql(&Type::NUMERIC, &bad_sign).is_err());
    }

    #[test]
    fn keeps_every_digit_as_json() {
        let text = NumericText("123456789012345678901234567890.000001".to_string());
        let value = text.into_value("sum").unwrap();
        assert_eq!(value.to_string(), "123456789012345678901234567890.000001");
    }
}
