use crate::translation::{AccessMode, Vpn};

/// Physical frame number
pub type FrameIndex = usize;

/// One physical page slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    index: FrameIndex,
    occupant: Option<Vpn>,
    last_access: u64,
    referenced: bool,
    dirty: bool,
}

impl Frame {
    fn new(index: FrameIndex) -> Self {
        Frame {
            index,
            occupant: None,
            last_access: 0,
            referenced: false,
            dirty: false,
        }
    }

    #[inline]
    pub fn index(&self) -> FrameIndex {
        self.index
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    /// Page currently held, if any
    #[inline]
    pub fn occupant(&self) -> Option<Vpn> {
        self.occupant
    }

    #[inline]
    pub fn last_access(&self) -> u64 {
        self.last_access
    }

    #[inline]
    pub fn referenced(&self) -> bool {
        self.referenced
    }

    #[inline]
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Logical ticks since this frame was last used
    #[inline]
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_access)
    }

    pub(crate) fn clear_referenced(&mut self) {
        self.referenced = false;
    }
}

/// Fixed set of physical frames with occupancy tracking
pub struct FramePool {
    frames: Vec<Frame>,
}

impl FramePool {
    /// Create a pool of `count` free frames
    pub fn new(count: usize) -> Self {
        FramePool {
            frames: (0..count).map(Frame::new).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, frame: FrameIndex) -> &Frame {
        &self.frames[frame]
    }

    pub(crate) fn get_mut(&mut self, frame: FrameIndex) -> &mut Frame {
        &mut self.frames[frame]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Lowest-numbered free frame
    pub fn find_free(&self) -> Option<FrameIndex> {
        self.frames.iter().position(Frame::is_free)
    }

    /// Bind `frame` to `vpn`, freshly loaded at logical time `now`
    pub fn mark_occupied(&mut self, frame: FrameIndex, vpn: Vpn, now: u64) {
        let slot = &mut self.frames[frame];
        slot.occupant = Some(vpn);
        slot.last_access = now;
        slot.referenced = true;
        slot.dirty = false;
    }

    /// Release `frame`, returning the page it held
    pub fn mark_free(&mut self, frame: FrameIndex) -> Option<Vpn> {
        let slot = &mut self.frames[frame];
        slot.referenced = false;
        slot.dirty = false;
        slot.occupant.take()
    }

    /// Record a hit on `frame`
    pub fn touch(&mut self, frame: FrameIndex, now: u64, mode: Option<AccessMode>) {
        let slot = &mut self.frames[frame];
        slot.last_access = now;
        slot.referenced = true;
        if mode == Some(AccessMode::Write) {
            slot.dirty = true;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.frames.iter().filter(|f| !f.is_free()).count()
    }

    pub fn is_full(&self) -> bool {
        self.frames.iter().all(|f| !f.is_free())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_initialization() {
        let pool = FramePool::new(8);
        assert_eq!(pool.len(), 8);
        assert_eq!(pool.occupied_count(), 0);
        assert!(pool.iter().all(Frame::is_free));
        assert_eq!(pool.get(5).index(), 5);
    }

    #[test]
    fn test_find_free_returns_lowest_index() {
        let mut pool = FramePool::new(4);
        assert_eq!(pool.find_free(), Some(0));

        pool.mark_occupied(0, 10, 1);
        pool.mark_occupied(2, 12, 2);
        assert_eq!(pool.find_free(), Some(1));

        pool.mark_occupied(1, 11, 3);
        assert_eq!(pool.find_free(), Some(3));

        pool.mark_occupied(3, 13, 4);
        assert_eq!(pool.find_free(), None);
        assert!(pool.is_full());
    }

    #[test]
    fn test_mark_occupied_sets_binding() {
        let mut pool = FramePool::new(2);
        pool.mark_occupied(1, 0x42, 7);

        let frame = pool.get(1);
        assert_eq!(frame.occupant(), Some(0x42));
        assert_eq!(frame.last_access(), 7);
        assert!(frame.referenced());
        assert!(!frame.dirty());
        assert_eq!(pool.occupied_count(), 1);
    }

    #[test]
    fn test_mark_free_returns_previous_occupant() {
        let mut pool = FramePool::new(2);
        pool.mark_occupied(0, 9, 1);
        pool.touch(0, 2, Some(AccessMode::Write));

        assert_eq!(pool.mark_free(0), Some(9));
        assert!(pool.get(0).is_free());
        assert!(!pool.get(0).dirty());
        assert_eq!(pool.mark_free(0), None);
    }

    #[test]
    fn test_touch_updates_access_state() {
        let mut pool = FramePool::new(1);
        pool.mark_occupied(0, 3, 1);
        pool.get_mut(0).clear_referenced();

        pool.touch(0, 5, Some(AccessMode::Read));
        assert!(pool.get(0).referenced());
        assert!(!pool.get(0).dirty());
        assert_eq!(pool.get(0).age(8), 3);

        pool.touch(0, 6, Some(AccessMode::Write));
        assert!(pool.get(0).dirty());
    }

    #[test]
    fn test_empty_pool() {
        let pool = FramePool::new(0);
        assert!(pool.is_empty());
        assert_eq!(pool.find_free(), None);
    }
}
