//! HCL blocks and the assembled configuration

use indexmap::IndexMap;

use crate::schema::Schema;
use crate::value::{INDENT, Value, quote};

/// Block type keyword
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Resource,
    Data,
    Variable,
    Locals,
    Output,
    /// A nested block, named after the argument it stands for
    Nested(String),
}

impl BlockKind {
    pub fn keyword(&self) -> &str {
        match self {
            Self::Resource => "resource",
            Self::Data => "data",
            Self::Variable => "variable",
            Self::Locals => "locals",
            Self::Output => "output",
            Self::Nested(name) => name,
        }
    }
}

/// A block argument
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// `name = value`, or a standalone comment
    Value(Value),
    /// A single nested block
    Block(Block),
    /// Repeated nested blocks; entries are [`Argument::Block`] or a
    /// commented-out [`Argument::Value`] for items that failed to convert
    Blocks(Vec<Argument>),
}

impl Argument {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    fn render(&self, name: &str, indent: usize) -> String {
        match self {
            Self::Value(value @ Value::Comment(_)) => value.render(indent),
            Self::Value(value) => format!("{}{} = {}", " ".repeat(indent), name, value.render(indent)),
            Self::Block(block) => block.render(indent),
            Self::Blocks(items) => items
                .iter()
                .map(|item| item.render(name, indent))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Block> for Argument {
    fn from(block: Block) -> Self {
        Self::Block(block)
    }
}

/// A block: type keyword, labels and ordered arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub labels: Vec<String>,
    pub arguments: IndexMap<String, Argument>,
    /// Argument names the target type documents
    pub valid_arguments: Vec<String>,
    /// Attribute names the target type exports
    pub valid_attributes: Vec<String>,
}

impl Block {
    pub fn new(kind: BlockKind, labels: Vec<String>) -> Self {
        Self {
            kind,
            labels,
            arguments: IndexMap::new(),
            valid_arguments: Vec::new(),
            valid_attributes: Vec::new(),
        }
    }

    /// `resource "<type>" "<name>"`, carrying the type's schema
    pub fn resource(schema: &Schema, name: impl Into<String>) -> Self {
        let mut block = Self::new(
            BlockKind::Resource,
            vec![schema.resource_type.clone(), name.into()],
        );
        block.valid_arguments = schema.arguments.clone();
        block.valid_attributes = schema.attributes.clone();
        block
    }

    /// `data "<type>" "<name>"`
    pub fn data(data_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(BlockKind::Data, vec![data_type.into(), name.into()])
    }

    /// `variable "<name>"`
    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(BlockKind::Variable, vec![name.into()])
    }

    /// `locals`
    pub fn locals() -> Self {
        Self::new(BlockKind::Locals, Vec::new())
    }

    /// `output "<name>"`
    pub fn output(name: impl Into<String>) -> Self {
        Self::new(BlockKind::Output, vec![name.into()])
    }

    /// A nested block
    pub fn nested(name: impl Into<String>) -> Self {
        Self::new(BlockKind::Nested(name.into()), Vec::new())
    }

    /// Builder-style argument insertion
    pub fn with(mut self, name: impl Into<String>, argument: impl Into<Argument>) -> Self {
        self.set(name, argument);
        self
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn set(&mut self, name: impl Into<String>, argument: impl Into<Argument>) {
        self.arguments.insert(name.into(), argument.into());
    }

    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.arguments.get(name)
    }

    /// Identity used to deduplicate auxiliary blocks
    pub fn identity(&self) -> (&BlockKind, &[String]) {
        (&self.kind, &self.labels)
    }

    pub fn same_identity(&self, other: &Block) -> bool {
        self.identity() == other.identity()
    }

    /// Address of the block without an attribute
    pub fn base_ref(&self) -> String {
        match self.kind {
            BlockKind::Resource => self.labels.join("."),
            BlockKind::Data => format!("data.{}", self.labels.join(".")),
            BlockKind::Variable => format!("var.{}", self.labels.join(".")),
            BlockKind::Locals => "local".to_string(),
            BlockKind::Output => format!("output.{}", self.labels.join(".")),
            BlockKind::Nested(ref name) => name.clone(),
        }
    }

    /// Expression referencing an attribute of this block.
    ///
    /// Without an explicit attribute the first documented attribute is used,
    /// falling back to `id`. Counted resources are addressed as instance `[0]`.
    pub fn reference(&self, attribute: Option<&str>) -> Value {
        if self.kind == BlockKind::Variable {
            return Value::literal(self.base_ref());
        }

        let count = if self.arguments.contains_key("count") {
            "[0]"
        } else {
            ""
        };
        let attribute = attribute
            .or_else(|| self.valid_attributes.first().map(String::as_str))
            .unwrap_or("id");

        Value::literal(format!("{}{}.{}", self.base_ref(), count, attribute))
    }

    /// Render the block starting at `indent` spaces
    pub fn render(&self, indent: usize) -> String {
        let brace_space = " ".repeat(indent);

        let mut header = format!("{}{}", brace_space, self.kind.keyword());
        for label in &self.labels {
            header.push(' ');
            header.push_str(&quote(label));
        }

        if self.arguments.is_empty() {
            return format!("{header} {{}}");
        }

        let body = self
            .arguments
            .iter()
            .map(|(name, argument)| argument.render(name, indent + INDENT))
            .collect::<Vec<_>>()
            .join("\n");

        format!("{header} {{\n{body}\n{brace_space}}}")
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(0))
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// The converted configuration: auxiliary blocks followed by main blocks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    blocks: Vec<Block>,
}

impl Configuration {
    /// Assemble a configuration, prepending the auxiliary blocks
    pub fn assemble(auxiliary: Vec<Block>, main: Vec<Block>) -> Self {
        let mut blocks = auxiliary;
        blocks.extend(main);
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks of one kind, in order
    pub fn of_kind<'a>(&'a self, kind: &'a BlockKind) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter(move |b| &b.kind == kind)
    }

    /// Render the whole configuration as one document
    pub fn render(&self) -> String {
        render_blocks(self.blocks.iter())
    }
}

/// Render blocks separated by blank lines, with a trailing newline
pub fn render_blocks<'a>(blocks: impl Iterator<Item = &'a Block>) -> String {
    let mut rendered = blocks.map(|b| b.render(0)).collect::<Vec<_>>().join("\n\n");
    if !rendered.is_empty() {
        rendered.push('\n');
    }
    rendered
}
