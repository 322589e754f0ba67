//! Small closed vocabularies carried by AST nodes.

use std::fmt;

/// Argument-passing intent of a formal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub enum Intent {
    #[default]
    Default,
    Const,
    ConstIn,
    ConstRef,
    In,
    Out,
    InOut,
    Ref,
    Param,
    Type,
}

impl Intent {
    /// Intents that write back through the actual and so need an l-value.
    pub fn needs_lvalue(self) -> bool {
        matches!(self, Intent::Out | Intent::InOut | Intent::Ref)
    }

    /// Whether the actual may be implicitly converted on the way in.
    pub fn allows_conversion(self) -> bool {
        matches!(
            self,
            Intent::Default | Intent::Const | Intent::ConstIn | Intent::In
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Default => "",
            Intent::Const => "const",
            Intent::ConstIn => "const in",
            Intent::ConstRef => "const ref",
            Intent::In => "in",
            Intent::Out => "out",
            Intent::InOut => "inout",
            Intent::Ref => "ref",
            Intent::Param => "param",
            Intent::Type => "type",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration keyword of a variable.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum VarKind {
    #[default]
    Var,
    Const,
    Ref,
    ConstRef,
    Param,
    Type,
}

/// Return intent of a function.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum ReturnIntent {
    #[default]
    Default,
    Const,
    Ref,
    ConstRef,
    Param,
    Type,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AggregateKind {
    Record,
    Class,
    Union,
}

impl AggregateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateKind::Record => "record",
            AggregateKind::Class => "class",
            AggregateKind::Union => "union",
        }
    }
}

/// Loop flavour. All bind an index variable over an iterand.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum LoopKind {
    For,
    Forall,
    Foreach,
    Coforall,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum UseKind {
    /// `use M`: M's top-level declarations become visible.
    Use,
    /// `import M`: only `M` itself becomes nameable.
    Import,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum FunctionKind {
    #[default]
    Proc,
    Iter,
    Operator,
}

/// Built-in operators.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum OpKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Assign,
    Not,
    Neg,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl OpKind {
    pub fn is_unary(self) -> bool {
        matches!(self, OpKind::Not | OpKind::Neg)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OpKind::Eq | OpKind::Ne | OpKind::Lt | OpKind::Le | OpKind::Gt | OpKind::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, OpKind::And | OpKind::Or | OpKind::Not)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            OpKind::Add => "+",
            OpKind::Sub | OpKind::Neg => "-",
            OpKind::Mul => "*",
            OpKind::Div => "/",
            OpKind::Mod => "%",
            OpKind::Assign => "=",
            OpKind::Not => "!",
            OpKind::And => "&&",
            OpKind::Or => "||",
            OpKind::Eq => "==",
            OpKind::Ne => "!=",
            OpKind::Lt => "<",
            OpKind::Le => "<=",
            OpKind::Gt => ">",
            OpKind::Ge => ">=",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
