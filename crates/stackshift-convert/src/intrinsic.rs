//! CloudFormation intrinsic functions and their nesting grammar
//!
//! Each function may only contain a fixed set of other functions. The table
//! is expressed as an exhaustive match, so adding a function forces a
//! decision about what it may contain.

use phf::phf_map;
use std::fmt;

/// A CloudFormation intrinsic function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    Ref,
    Condition,
    And,
    Equals,
    If,
    Not,
    Or,
    Base64,
    Cidr,
    FindInMap,
    GetAtt,
    GetAZs,
    ImportValue,
    Join,
    Select,
    Split,
    Sub,
    Transform,
}

static BY_KEY: phf::Map<&'static str, Intrinsic> = phf_map! {
    "Ref" => Intrinsic::Ref,
    "Condition" => Intrinsic::Condition,
    "Fn::And" => Intrinsic::And,
    "Fn::Equals" => Intrinsic::Equals,
    "Fn::If" => Intrinsic::If,
    "Fn::Not" => Intrinsic::Not,
    "Fn::Or" => Intrinsic::Or,
    "Fn::Base64" => Intrinsic::Base64,
    "Fn::Cidr" => Intrinsic::Cidr,
    "Fn::FindInMap" => Intrinsic::FindInMap,
    "Fn::GetAtt" => Intrinsic::GetAtt,
    "Fn::GetAZs" => Intrinsic::GetAZs,
    "Fn::ImportValue" => Intrinsic::ImportValue,
    "Fn::Join" => Intrinsic::Join,
    "Fn::Select" => Intrinsic::Select,
    "Fn::Split" => Intrinsic::Split,
    "Fn::Sub" => Intrinsic::Sub,
    "Fn::Transform" => Intrinsic::Transform,
};

use Intrinsic::*;

/// Functions allowed at the top level of a condition expression
pub const CONDITION_FUNCTIONS: &[Intrinsic] = &[And, Equals, If, Not, Or, Condition];

/// Functions allowed at the top level of resource properties and output values
pub const PROPERTY_FUNCTIONS: &[Intrinsic] = &[
    If, Base64, Cidr, FindInMap, GetAtt, GetAZs, ImportValue, Join, Select, Split, Sub, Transform,
    Ref,
];

const ALL: &[Intrinsic] = &[
    Ref, Condition, And, Equals, If, Not, Or, Base64, Cidr, FindInMap, GetAtt, GetAZs, ImportValue,
    Join, Select, Split, Sub, Transform,
];

const CONDITION_OPERANDS: &[Intrinsic] = &[FindInMap, Ref, And, Equals, If, Not, Or, Condition];

const JOIN_OPERANDS: &[Intrinsic] = &[
    Base64, FindInMap, GetAtt, GetAZs, If, ImportValue, Join, Split, Select, Sub, Ref,
];

impl Intrinsic {
    /// Look up a function by its template key (`Ref`, `Fn::Join`, ...)
    pub fn from_key(key: &str) -> Option<Self> {
        BY_KEY.get(key).copied()
    }

    /// The template key for this function
    pub fn key(&self) -> &'static str {
        match self {
            Ref => "Ref",
            Condition => "Condition",
            And => "Fn::And",
            Equals => "Fn::Equals",
            If => "Fn::If",
            Not => "Fn::Not",
            Or => "Fn::Or",
            Base64 => "Fn::Base64",
            Cidr => "Fn::Cidr",
            FindInMap => "Fn::FindInMap",
            GetAtt => "Fn::GetAtt",
            GetAZs => "Fn::GetAZs",
            ImportValue => "Fn::ImportValue",
            Join => "Fn::Join",
            Select => "Fn::Select",
            Split => "Fn::Split",
            Sub => "Fn::Sub",
            Transform => "Fn::Transform",
        }
    }

    /// Functions that may appear inside this function's arguments
    pub fn allowed_nested(&self) -> &'static [Intrinsic] {
        match self {
            And | Equals | Not | Or => CONDITION_OPERANDS,
            If => &[Base64, FindInMap, GetAtt, GetAZs, If, Join, Select, Sub, Ref],
            Condition => &[],
            Base64 => ALL,
            Cidr => &[Select, Ref],
            FindInMap => &[FindInMap, Ref],
            GetAtt => &[],
            GetAZs => &[Ref],
            ImportValue => &[Base64, FindInMap, If, Join, Select, Split, Sub, Ref],
            Join | Split => JOIN_OPERANDS,
            Select => &[FindInMap, GetAtt, GetAZs, If, Split, Ref],
            Sub => &[Base64, FindInMap, GetAtt, GetAZs, If, ImportValue, Join, Select, Ref],
            Transform => &[],
            Ref => &[],
        }
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
