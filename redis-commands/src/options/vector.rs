use bytes::Bytes;
use resp_proto::Token;

use super::Render;
use crate::arg::Arg;
use crate::error::Error;

/// A query or insertion vector for vector set commands.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorInput {
    /// `FP32 blob`: little-endian packed 32-bit floats.
    Fp32(Bytes),
    /// `VALUES n v1 .. vn`.
    Values(Vec<f64>),
}

impl VectorInput {
    /// Accepts a list of numbers, a packed blob, or a map with a `values` or
    /// `fp32` entry.
    pub fn from_arg(command: &str, arg: &Arg) -> Result<Self, Error> {
        let invalid = || Error::invalid(command, "Invalid vector argument value given");
        match arg {
            Arg::Bytes(blob) => Ok(Self::Fp32(blob.clone())),
            Arg::List(items) if !items.is_empty() => items
                .iter()
                .map(Arg::as_float)
                .collect::<Option<Vec<f64>>>()
                .map(Self::Values)
                .ok_or_else(invalid),
            Arg::Map(_) => {
                if let Some(blob) = arg.get("fp32") {
                    return blob
                        .as_bytes()
                        .map(|b| Self::Fp32(b.clone()))
                        .ok_or_else(invalid);
                }
                match arg.get("values") {
                    Some(values) => Self::from_arg(command, values),
                    None => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }
}

/// Pack floats the way `FP32` inputs expect them.
pub fn fp32_blob(values: &[f32]) -> Bytes {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    Bytes::from(out)
}

impl Render for VectorInput {
    fn render(&self, out: &mut Vec<Token>) {
        match self {
            Self::Fp32(blob) => {
                out.push(Token::from_static("FP32"));
                out.push(Token::Bulk(blob.clone()));
            }
            Self::Values(values) => {
                out.push(Token::from_static("VALUES"));
                out.push(Token::Int(values.len() as i64));
                out.extend(values.iter().map(|v| Token::Float(*v)));
            }
        }
    }
}

impl From<VectorInput> for Arg {
    fn from(input: VectorInput) -> Self {
        match input {
            VectorInput::Fp32(blob) => Arg::map([("fp32", blob)]),
            VectorInput::Values(values) => Arg::from(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens;

    #[test]
    fn test_values() {
        let input = VectorInput::from_arg("VADD", &Arg::from([0.1, 0.2])).unwrap();
        assert_eq!(input.to_tokens(), tokens!["VALUES", 2, 0.1, 0.2]);
    }

    #[test]
    fn test_fp32() {
        let blob = fp32_blob(&[1.0]);
        assert_eq!(&blob[..], &1.0f32.to_le_bytes());
        let input = VectorInput::from_arg("VADD", &Arg::from(blob.clone())).unwrap();
        assert_eq!(input.to_tokens(), vec![Token::from("FP32"), Token::Bulk(blob)]);
    }

    #[test]
    fn test_round_trip_through_arg() {
        let input = VectorInput::Values(vec![1.0, 2.0]);
        assert_eq!(VectorInput::from_arg("VSIM", &Arg::from(input.clone())).unwrap(), input);
    }

    #[test]
    fn test_invalid() {
        let err = VectorInput::from_arg("VADD", &Arg::Int(3)).unwrap_err();
        assert_eq!(err.to_string(), "VADD: Invalid vector argument value given");
        assert!(VectorInput::from_arg("VADD", &Arg::from(["a", "b"])).is_err());
    }
}
