//! Auxiliary block log
//!
//! Resolving expressions can require declarations that do not exist in the
//! source template: a `data "aws_region"` block for `AWS::Region`, a
//! placeholder variable for an imported value, the shared `locals` block.
//! They are appended here as a side effect of resolution and prepended to
//! the configuration when it is assembled.

use stackshift_core::{Block, BlockKind};

#[derive(Debug, Clone, Default)]
pub struct AuxLog {
    blocks: Vec<Block>,
}

impl AuxLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block unless one with the same identity already exists.
    /// Returns the block held by the log.
    pub fn register(&mut self, block: Block) -> &Block {
        let index = match self.blocks.iter().position(|b| b.same_identity(&block)) {
            Some(index) => index,
            None => {
                tracing::debug!(block = %block.base_ref(), "registering auxiliary block");
                self.blocks.push(block);
                self.blocks.len() - 1
            }
        };
        &self.blocks[index]
    }

    /// Append a block unconditionally
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// All `locals` blocks in the log
    pub fn locals(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.kind == BlockKind::Locals)
    }

    /// The shared `locals` block, created on first use
    pub fn locals_mut(&mut self) -> &mut Block {
        let index = match self.blocks.iter().position(|b| b.kind == BlockKind::Locals) {
            Some(index) => index,
            None => {
                self.blocks.push(Block::locals());
                self.blocks.len() - 1
            }
        };
        &mut self.blocks[index]
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

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}
