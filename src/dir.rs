//! Директория записей: порядок в памяти == порядок байтов в файле.
//!
//! Арена (slab) дескрипторов со стабильными индексами и явными prev/next
//! ссылками вместо указателей — сплайс за O(1), без циклов владения.
//! Индексы освобождённых ячеек переиспользуются через vacant-список.

use crate::record::Record;

struct Node {
    rec: Record,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Default)]
pub struct Directory {
    slots: Vec<Option<Node>>,
    vacant: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl Directory {
    pub fn new() -> Directory {
        Directory::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    #[inline]
    pub fn tail(&self) -> Option<usize> {
        self.tail
    }

    pub fn rec(&self, idx: usize) -> &Record {
        &self.node(idx).rec
    }

    pub fn rec_mut(&mut self, idx: usize) -> &mut Record {
        &mut self.node_mut(idx).rec
    }

    pub fn prev(&self, idx: usize) -> Option<usize> {
        self.node(idx).prev
    }

    pub fn next(&self, idx: usize) -> Option<usize> {
        self.node(idx).next
    }

    /// Логический конец файла: первый байт за хвостовой записью.
    pub fn end_addr(&self) -> u64 {
        self.tail.map(|t| self.rec(t).end()).unwrap_or(0)
    }

    /// Последовательность записей в порядке файла.
    pub fn scan(&self) -> Scan<'_> {
        Scan {
            dir: self,
            cur: self.head,
        }
    }

    /// Первая живая запись с данным ключом.
    pub fn find_used(&self, key: &[u8]) -> Option<usize> {
        self.scan()
            .find(|(_, r)| r.used && r.key.as_slice() == key)
            .map(|(idx, _)| idx)
    }

    pub fn push_back(&mut self, rec: Record) -> usize {
        let prev = self.tail;
        let idx = self.alloc(Node {
            rec,
            prev,
            next: None,
        });
        match prev {
            Some(t) => self.node_mut(t).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
        idx
    }

    /// Вставить запись сразу после anchor (остаток при split).
    pub fn insert_after(&mut self, anchor: usize, rec: Record) -> usize {
        let next = self.node(anchor).next;
        let idx = self.alloc(Node {
            rec,
            prev: Some(anchor),
            next,
        });
        self.node_mut(anchor).next = Some(idx);
        match next {
            Some(n) => self.node_mut(n).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.len += 1;
        idx
    }

    /// Выплести запись, связав бывших соседей напрямую.
    pub fn remove(&mut self, idx: usize) -> Record {
        let node = match self.slots[idx].take() {
            Some(n) => n,
            None => unreachable!("directory slot {} is vacant", idx),
        };
        match node.prev {
            Some(p) => self.node_mut(p).next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.node_mut(n).prev = node.prev,
            None => self.tail = node.prev,
        }
        self.vacant.push(idx);
        self.len -= 1;
        node.rec
    }

    fn alloc(&mut self, node: Node) -> usize {
        match self.vacant.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn node(&self, idx: usize) -> &Node {
        match self.slots[idx].as_ref() {
            Some(n) => n,
            None => unreachable!("directory slot {} is vacant", idx),
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node {
        match self.slots[idx].as_mut() {
            Some(n) => n,
            None => unreachable!("directory slot {} is vacant", idx),
        }
    }
}

pub struct Scan<'a> {
    dir: &'a Directory,
    cur: Option<usize>,
}

impl<'a> Iterator for Scan<'a> {
    type Item = (usize, &'a Record);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cur?;
        let node = self.dir.node(idx);
        self.cur = node.next;
        Some((idx, &node.rec))
    }
}
