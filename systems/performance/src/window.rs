use std::collections::VecDeque;

/// Fixed-capacity FIFO of samples; pushing into a full window evicts the oldest.
#[derive(Debug)]
pub(crate) struct RollingWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl RollingWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, value: f32) {
        while self.samples.len() >= self.capacity {
            let _ = self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub(crate) fn mean(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        let total: f32 = self.samples.iter().sum();
        Some(total / self.samples.len() as f32)
    }

    pub(crate) fn len(&self) -> usize {
        self.samples.len()
    }

    pub(crate) fn clear(&mut self) {
        self.samples.clear();
    }

    #[cfg(test)]
    fn oldest(&self) -> Option<f32> {
        self.samples.front().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::RollingWindow;

    #[test]
    fn evicts_oldest_once_full() {
        let mut window = RollingWindow::new(3);
        for value in [1.0, 2.0, 3.0, 4.0] {
            window.push(value);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.oldest(), Some(2.0));
        assert_eq!(window.mean(), Some(3.0));
    }

    #[test]
    fn empty_window_has_no_mean() {
        let mut window = RollingWindow::new(2);
        assert_eq!(window.mean(), None);
        window.push(5.0);
        window.clear();
        assert_eq!(window.mean(), None);
    }
}
