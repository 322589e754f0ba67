//! Compile-time values and constant folding.

use std::fmt;

use crest_ir::{Name, OpKind};

use crate::TypeId;

/// A compile-time ("param") value. Compared structurally; reals by bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamValue {
    Int(i64),
    Uint(u64),
    /// IEEE-754 bits.
    Real(u64),
    Bool(bool),
    Str(Name),
}

impl ParamValue {
    pub fn real(value: f64) -> Self {
        ParamValue::Real(value.to_bits())
    }

    /// Intrinsic type of the value.
    pub fn type_id(self) -> TypeId {
        match self {
            ParamValue::Int(_) => TypeId::INT,
            ParamValue::Uint(_) => TypeId::UINT,
            ParamValue::Real(_) => TypeId::REAL,
            ParamValue::Bool(_) => TypeId::BOOL,
            ParamValue::Str(_) => TypeId::STRING,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(v),
            ParamValue::Uint(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    fn as_f64(self) -> Option<f64> {
        match self {
            ParamValue::Real(bits) => Some(f64::from_bits(bits)),
            #[allow(clippy::cast_precision_loss)]
            ParamValue::Int(v) => Some(v as f64),
            #[allow(clippy::cast_precision_loss)]
            ParamValue::Uint(v) => Some(v as f64),
            _ => None,
        }
    }

    /// Convert for passing to a formal of type `target`, as the implicit
    /// param conversions allow. `None` if the value does not fit.
    pub fn coerce(self, target: TypeId) -> Option<ParamValue> {
        match (self, target) {
            (v, t) if v.type_id() == t => Some(v),
            (ParamValue::Int(v), TypeId::UINT) => u64::try_from(v).ok().map(ParamValue::Uint),
            (ParamValue::Uint(v), TypeId::INT) => i64::try_from(v).ok().map(ParamValue::Int),
            (ParamValue::Int(_) | ParamValue::Uint(_), TypeId::REAL) => {
                self.as_f64().map(ParamValue::real)
            }
            _ => None,
        }
    }

    /// Fold a unary operator. `None` when the operator does not apply or the
    /// result is not representable.
    pub fn fold_unary(op: OpKind, operand: ParamValue) -> Option<ParamValue> {
        match (op, operand) {
            (OpKind::Not, ParamValue::Bool(b)) => Some(ParamValue::Bool(!b)),
            (OpKind::Neg, ParamValue::Int(v)) => v.checked_neg().map(ParamValue::Int),
            (OpKind::Neg, ParamValue::Real(bits)) => {
                Some(ParamValue::real(-f64::from_bits(bits)))
            }
            _ => None,
        }
    }

    /// Fold a binary operator over two values of the same type (after
    /// promoting mixed int/uint/real operands).
    pub fn fold_binary(op: OpKind, lhs: ParamValue, rhs: ParamValue) -> Option<ParamValue> {
        let (lhs, rhs) = Self::promote(lhs, rhs)?;
        match (lhs, rhs) {
            (ParamValue::Int(a), ParamValue::Int(b)) => fold_ordered(op, a, b, |op, a, b| {
                match op {
                    OpKind::Add => a.checked_add(b),
                    OpKind::Sub => a.checked_sub(b),
                    OpKind::Mul => a.checked_mul(b),
                    OpKind::Div => a.checked_div(b),
                    OpKind::Mod => a.checked_rem(b),
                    _ => None,
                }
                .map(ParamValue::Int)
            }),
            (ParamValue::Uint(a), ParamValue::Uint(b)) => fold_ordered(op, a, b, |op, a, b| {
                match op {
                    OpKind::Add => a.checked_add(b),
                    OpKind::Sub => a.checked_sub(b),
                    OpKind::Mul => a.checked_mul(b),
                    OpKind::Div => a.checked_div(b),
                    OpKind::Mod => a.checked_rem(b),
                    _ => None,
                }
                .map(ParamValue::Uint)
            }),
            (ParamValue::Real(a), ParamValue::Real(b)) => {
                let (a, b) = (f64::from_bits(a), f64::from_bits(b));
                match op {
                    OpKind::Add => Some(ParamValue::real(a + b)),
                    OpKind::Sub => Some(ParamValue::real(a - b)),
                    OpKind::Mul => Some(ParamValue::real(a * b)),
                    OpKind::Div => Some(ParamValue::real(a / b)),
                    OpKind::Lt => Some(ParamValue::Bool(a < b)),
                    OpKind::Le => Some(ParamValue::Bool(a <= b)),
                    OpKind::Gt => Some(ParamValue::Bool(a > b)),
                    OpKind::Ge => Some(ParamValue::Bool(a >= b)),
                    #[allow(clippy::float_cmp)]
                    OpKind::Eq => Some(ParamValue::Bool(a == b)),
                    #[allow(clippy::float_cmp)]
                    OpKind::Ne => Some(ParamValue::Bool(a != b)),
                    _ => None,
                }
            }
            (ParamValue::Bool(a), ParamValue::Bool(b)) => match op {
                OpKind::And => Some(ParamValue::Bool(a && b)),
                OpKind::Or => Some(ParamValue::Bool(a || b)),
                OpKind::Eq => Some(ParamValue::Bool(a == b)),
                OpKind::Ne => Some(ParamValue::Bool(a != b)),
                _ => None,
            },
            (ParamValue::Str(a), ParamValue::Str(b)) => match op {
                OpKind::Eq => Some(ParamValue::Bool(a == b)),
                OpKind::Ne => Some(ParamValue::Bool(a != b)),
                _ => None,
            },
            _ => None,
        }
    }

    fn promote(lhs: ParamValue, rhs: ParamValue) -> Option<(ParamValue, ParamValue)> {
        use ParamValue::{Int, Real, Uint};
        match (lhs, rhs) {
            (Int(_), Uint(_)) => Some((lhs, rhs.coerce(TypeId::INT)?)),
            (Uint(_), Int(_)) => Some((lhs.coerce(TypeId::INT)?, rhs)),
            (Real(_), Int(_) | Uint(_)) => Some((lhs, rhs.coerce(TypeId::REAL)?)),
            (Int(_) | Uint(_), Real(_)) => Some((lhs.coerce(TypeId::REAL)?, rhs)),
            _ => Some((lhs, rhs)),
        }
    }
}

fn fold_ordered<T: Ord + Copy>(
    op: OpKind,
    a: T,
    b: T,
    arith: impl FnOnce(OpKind, T, T) -> Option<ParamValue>,
) -> Option<ParamValue> {
    match op {
        OpKind::Eq => Some(ParamValue::Bool(a == b)),
        OpKind::Ne => Some(ParamValue::Bool(a != b)),
        OpKind::Lt => Some(ParamValue::Bool(a < b)),
        OpKind::Le => Some(ParamValue::Bool(a <= b)),
        OpKind::Gt => Some(ParamValue::Bool(a > b)),
        OpKind::Ge => Some(ParamValue::Bool(a >= b)),
        _ => arith(op, a, b),
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Uint(v) => write!(f, "{v}"),
            ParamValue::Real(bits) => write!(f, "{}", f64::from_bits(*bits)),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Str(name) => write!(f, "\"{name:?}\""),
        }
    }
}
