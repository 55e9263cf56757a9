pub(crate) const BLOCKS_PER_PAGE: usize = 25;
pub(crate) const MAX_BLOCKS_PER_REQUEST: usize = BLOCKS_PER_PAGE * 10;
