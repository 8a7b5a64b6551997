//! Flat arena union-find used for connectivity over variables and signed
//! literal identities. Indices are small integer ids, no pointer chasing.

pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
    count: usize,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
            count: size,
        }
    }

    pub fn find(&mut self, mut i: usize) -> usize {
        // path halving
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }

        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        self.count -= 1;
    }

    pub fn connected(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Number of disjoint sets, including the nominal zero bucket.
    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::UnionFind;

    #[test]
    fn basic() {
        let mut uf = UnionFind::new(5);
        assert_eq!(uf.count(), 5);

        uf.union(1, 2);
        uf.union(3, 4);
        assert_eq!(uf.count(), 3);
        assert!(uf.connected(1, 2));
        assert!(!uf.connected(2, 3));

        uf.union(2, 4);
        assert_eq!(uf.count(), 2);
        assert!(uf.connected(1, 3));
    }

    #[test]
    fn redundant_union() {
        let mut uf = UnionFind::new(3);
        uf.union(1, 2);
        uf.union(2, 1);
        assert_eq!(uf.count(), 2);
    }
}
