use crate::cells::CellId;

/// Bit set of cells that raised a "changed" event since the host last collected them.
pub struct ChangedCellSet {
    set: Vec<u8>,
}

impl ChangedCellSet {
    pub fn new(cell_count: usize) -> Self {
        ChangedCellSet {
            set: vec![0; Self::byte_count(cell_count)],
        }
    }

    fn byte_count(cell_count: usize) -> usize {
        (cell_count / 8) + (if cell_count % 8 != 0 { 1 } else { 0 })
    }

    pub fn resize(&mut self, cell_count: usize) {
        let elem_count = Self::byte_count(cell_count);
        if elem_count > self.set.len() {
            self.set.resize(elem_count, 0);
        }
    }

    pub fn contains(&self, cell: CellId) -> bool {
        let byte_index = cell.index() / 8;
        let mask = 1 << (cell.index() % 8);
        self.set
            .get(byte_index)
            .map_or(false, |byte| byte & mask > 0)
    }

    pub fn set(&mut self, cell: CellId) {
        let byte_index = cell.index() / 8;
        let mask = 1 << (cell.index() % 8);
        self.set[byte_index] |= mask;
    }

    pub fn is_empty(&self) -> bool {
        self.set.iter().all(|byte| *byte == 0)
    }

    /// Returns every flagged cell in ascending order and clears the set.
    pub fn drain(&mut self) -> Vec<CellId> {
        let mut cells = Vec::new();
        for (byte_index, byte) in self.set.iter_mut().enumerate() {
            if *byte == 0 {
                continue;
            }
            for bit_index in 0..8 {
                if *byte & (1 << bit_index) > 0 {
                    cells.push(CellId::new(byte_index * 8 + bit_index));
                }
            }
            *byte = 0;
        }
        cells
    }
}

#[test]
fn test_create() {
    let set = ChangedCellSet::new(8);
    assert_eq!(1, set.set.len());

    let set = ChangedCellSet::new(9);
    assert_eq!(2, set.set.len());

    let set = ChangedCellSet::new(16);
    assert_eq!(2, set.set.len());

    let mut set = ChangedCellSet::new(17);
    assert_eq!(3, set.set.len());

    set.resize(25);
    assert_eq!(4, set.set.len());
}

#[test]
fn test_insert() {
    let mut set = ChangedCellSet::new(20);
    assert_eq!(false, set.contains(CellId::new(0)));
    assert_eq!(false, set.contains(CellId::new(2)));
    set.set(CellId::new(0));
    assert_eq!(true, set.contains(CellId::new(0)));
    assert_eq!(false, set.contains(CellId::new(1)));
    set.set(CellId::new(9));
    assert_eq!(true, set.contains(CellId::new(9)));
    assert_eq!(false, set.contains(CellId::new(100)));
}

#[test]
fn test_drain() {
    let mut set = ChangedCellSet::new(20);
    for i in &[0, 8, 17, 8] {
        set.set(CellId::new(*i));
    }
    assert_eq!(false, set.contains(CellId::new(9)));

    let drained = set.drain();
    assert_eq!(
        vec![CellId::new(0), CellId::new(8), CellId::new(17)],
        drained
    );
    assert!(set.is_empty());
}
