//! §4.9 DuplicateClusterer: partitions a batch of raw addresses into
//! equivalence classes by pairwise matcher similarity, blocking by province
//! to avoid an O(n^2) scan once the batch grows past the naive-comparison
//! ceiling.

use crate::geocoder::{CoordTables, Geocoder};
use crate::matcher::Matcher;
use crate::parser::Parser;
use crate::reference_db::ReferenceIndex;
use crate::turkish_text::{ascii_fold, normalize_for_compare};
use crate::{AddressComponents, Coordinate, PrecisionLevel};
use roaring::RoaringBitmap;
use std::collections::HashMap;

/// Above this batch size, candidate pairs are restricted to the blocking
/// keys in §4.9; below it, the naive O(n^2) comparison is acceptable.
const NAIVE_SCAN_CEILING: usize = 500;

/// Blocking radius for the "near coordinate" candidate-pair criterion (§4.9).
const BLOCKING_COORD_KM: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClusterStats {
    pub group_count: usize,
    pub unique_count: usize,
    pub duplication_rate: f64,
}

pub struct DuplicateClusterer<'a> {
    idx: &'a ReferenceIndex,
    threshold: f64,
    coord_tables: CoordTables,
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

impl<'a> DuplicateClusterer<'a> {
    pub fn new(idx: &'a ReferenceIndex, threshold: f64) -> Self {
        Self { idx, threshold, coord_tables: CoordTables::default() }
    }

    pub fn with_coord_tables(mut self, tables: CoordTables) -> Self {
        self.coord_tables = tables;
        self
    }

    pub fn cluster(&self, raws: &[String]) -> (Vec<Vec<usize>>, ClusterStats) {
        let n = raws.len();
        let mut uf = UnionFind::new(n);
        let matcher = Matcher::new(self.idx).with_coord_tables(self.coord_tables.clone());
        let parser = Parser::new(self.idx);
        let geocoder = Geocoder::new(&self.coord_tables);

        let components: Vec<AddressComponents> = raws.iter().map(|raw| parser.parse(raw).components).collect();
        let provinces: Vec<Option<String>> = components
            .iter()
            .map(|c| c.province_value().map(normalize_for_compare))
            .collect();
        let coords: Vec<Option<Coordinate>> = components
            .iter()
            .map(|c| {
                let geocode = geocoder.geocode(c);
                (geocode.precision != PrecisionLevel::None).then_some(geocode.coordinate)
            })
            .collect();
        let token_sets: Vec<std::collections::HashSet<String>> = raws
            .iter()
            .map(|raw| raw.split_whitespace().map(ascii_fold).collect())
            .collect();

        for (a, b) in self.candidate_pairs(n, &provinces, &coords, &token_sets) {
            let result = matcher.compare(&raws[a], &raws[b]);
            if result.overall >= self.threshold {
                uf.union(a, b);
            }
        }

        let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
        for i in 0..n {
            let root = uf.find(i);
            groups.entry(root).or_default().push(i);
        }

        let clusters: Vec<Vec<usize>> = groups.into_values().collect();
        let group_count = clusters.iter().filter(|g| g.len() > 1).count();
        let unique_count = clusters.len();
        let duplication_rate = if n == 0 { 0.0 } else { 1.0 - unique_count as f64 / n as f64 };

        (clusters, ClusterStats { group_count, unique_count, duplication_rate })
    }

    /// Candidate pairs sharing at least one blocking key (§4.9): same
    /// province, coordinates within [`BLOCKING_COORD_KM`], or token overlap
    /// `>= 0.5`. Below [`NAIVE_SCAN_CEILING`] every pair is a candidate.
    fn candidate_pairs(
        &self,
        n: usize,
        provinces: &[Option<String>],
        coords: &[Option<Coordinate>],
        token_sets: &[std::collections::HashSet<String>],
    ) -> Vec<(usize, usize)> {
        if n <= NAIVE_SCAN_CEILING {
            let mut pairs = Vec::new();
            for i in 0..n {
                for j in (i + 1)..n {
                    pairs.push((i, j));
                }
            }
            return pairs;
        }

        let mut by_province: HashMap<String, RoaringBitmap> = HashMap::new();
        for (i, province) in provinces.iter().enumerate() {
            if let Some(p) = province {
                by_province.entry(p.clone()).or_default().insert(i as u32);
            }
        }

        let mut pairs = std::collections::HashSet::new();
        for bitmap in by_province.values() {
            let members: Vec<u32> = bitmap.iter().collect();
            for (x, &i) in members.iter().enumerate() {
                for &j in &members[x + 1..] {
                    pairs.insert((i as usize, j as usize));
                }
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if pairs.contains(&(i, j)) {
                    continue;
                }

                if let (Some(ci), Some(cj)) = (coords[i], coords[j]) {
                    if ci.haversine_km(&cj) <= BLOCKING_COORD_KM {
                        pairs.insert((i, j));
                        continue;
                    }
                }

                let max_len = token_sets[i].len().max(token_sets[j].len()).max(1);
                let overlap = token_sets[i].intersection(&token_sets[j]).count() as f64 / max_len as f64;
                if overlap >= 0.5 {
                    pairs.insert((i, j));
                }
            }
        }

        pairs.into_iter().collect()
    }
}
