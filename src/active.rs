/// Ordered coordinate keys of every non-empty cell, so a step never scans the whole grid
#[derive(Debug, Default, Clone)]
pub struct ActiveSet {
    order: Vec<(usize, usize)>,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: usize, y: usize) {
        self.order.push((x, y));
    }

    /// Hand out the current sequence and leave the set empty for rebuilding
    pub fn take(&mut self) -> Vec<(usize, usize)> {
        std::mem::take(&mut self.order)
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.order.iter().copied()
    }
}
