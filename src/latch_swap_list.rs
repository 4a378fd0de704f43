use crate::cells::{CellId, LogicState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingInput {
    pub cell: CellId,
    pub input: usize,
    pub state: LogicState,
}

/// Two lists of input writes. Writes always land in the next list; at the start of a tick the
/// lists swap and the current one is committed, so nothing written during a tick is visible
/// before the following one.
pub struct LatchSwapList {
    lists: [Vec<PendingInput>; 2],
    indices: (u8, u8),
}

impl LatchSwapList {
    pub fn new() -> Self {
        LatchSwapList {
            lists: [Vec::with_capacity(256), Vec::with_capacity(256)],
            indices: (0, 1),
        }
    }

    pub fn cur_list(&self) -> &[PendingInput] {
        let (cur_list, _) = self.indices;
        &self.lists[cur_list as usize]
    }

    pub fn push_next_list(&mut self, pending: PendingInput) {
        let (_, next_list) = self.indices;
        self.lists[next_list as usize].push(pending);
    }

    pub fn next_list(&self) -> &[PendingInput] {
        let (_, next_list) = self.indices;
        &self.lists[next_list as usize]
    }

    pub fn is_next_list_empty(&self) -> bool {
        self.next_list().is_empty()
    }

    pub fn swap(&mut self) {
        let (cur_list, next_list) = self.indices;
        self.lists[cur_list as usize].clear();
        self.indices = (next_list, cur_list);
    }

    pub fn clear(&mut self) {
        self.lists[0].clear();
        self.lists[1].clear();
        self.indices = (0, 1);
    }
}

impl Default for LatchSwapList {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn test_swap() {
    let write = |cell: usize| PendingInput {
        cell: CellId::new(cell),
        input: 0,
        state: LogicState::High,
    };

    let mut list = LatchSwapList::new();
    list.push_next_list(write(1));
    assert!(list.cur_list().is_empty());
    assert!(!list.is_next_list_empty());

    list.swap();
    assert_eq!(&[write(1)], list.cur_list());
    assert!(list.is_next_list_empty());

    list.push_next_list(write(2));
    list.swap();
    assert_eq!(&[write(2)], list.cur_list());

    list.clear();
    assert!(list.cur_list().is_empty());
    assert!(list.is_next_list_empty());
}
