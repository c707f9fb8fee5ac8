use crate::state::BlockType;

/// The block-type transition table. The quote action cycles
/// quote → aside → paragraph, and re-requesting the active heading level
/// reverts to a paragraph; every other request resolves to itself. List kinds
/// and code blocks are set-only: no revert row exists for them.
pub fn resolve_block_transition(current: BlockType, requested: BlockType) -> BlockType {
    use BlockType::*;

    match (current, requested) {
        (Quote, Quote) => Aside,
        (Aside, Quote) => Paragraph,
        (Aside, Aside) => Paragraph,
        (Heading(current), Heading(requested)) if current == requested => Paragraph,
        (_, requested) => requested,
    }
}
