//! Online connected-components scan that decides, from level geometry alone,
//! which cells are connected to at least one point cell.
//!
//! Rows are fed top to bottom. Each row is split into [`Section`]s (maximal
//! runs of non-wall cells). Open groups on the frontline remember the
//! sections of the previous row (their bottom edge); a new section joins
//! every group whose bottom it overlaps, and a section touching several
//! groups merges them. Group membership lives in a disjoint-set forest over
//! section indices, so merges are associative and "inside" propagates to
//! sections added long before the merge happened.

use crate::maze::CellKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub end: usize,
    pub is_inside: bool,
}

impl Section {
    /// Inclusive on both ends, so single-width corridors connect vertically.
    pub fn overlaps(&self, other: &Section) -> bool {
        other.start <= self.end && other.end >= self.start
    }

    pub fn contains(&self, column: usize) -> bool {
        self.start <= column && column <= self.end
    }
}

pub fn split_sections(row: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut open = false;
    for (column, ch) in row.chars().enumerate() {
        let kind = CellKind::classify(ch);
        if kind == CellKind::Wall {
            open = false;
            continue;
        }
        let is_point = kind == CellKind::Point;
        match sections.last_mut() {
            Some(last) if open => {
                last.end = column;
                last.is_inside |= is_point;
            }
            _ => {
                sections.push(Section {
                    start: column,
                    end: column,
                    is_inside: is_point,
                });
                open = true;
            }
        }
    }
    sections
}

#[derive(Clone, Debug)]
struct OpenGroup {
    root: usize,
    bottom: Vec<usize>,
}

/// Construction phase. Queries only exist on the [`ReachabilityMap`]
/// returned by [`ReachabilityBuilder::finish`].
#[derive(Clone, Debug, Default)]
pub struct ReachabilityBuilder {
    sections: Vec<Section>,
    row_bounds: Vec<(usize, usize)>,
    parent: Vec<usize>,
    inside: Vec<bool>,
    frontline: Vec<OpenGroup>,
}

impl ReachabilityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, row: &str) {
        let first = self.sections.len();
        for section in split_sections(row) {
            let id = self.sections.len();
            self.sections.push(section);
            self.parent.push(id);
            self.inside.push(section.is_inside);
        }
        let last = self.sections.len();
        self.row_bounds.push((first, last));

        let mut next_bottoms: Vec<Vec<usize>> = vec![Vec::new(); self.frontline.len()];
        let mut fresh = Vec::new();
        for id in first..last {
            let section = self.sections[id];
            let touching: Vec<usize> = self
                .frontline
                .iter()
                .enumerate()
                .filter(|(_, group)| {
                    group
                        .bottom
                        .iter()
                        .any(|&bottom| self.sections[bottom].overlaps(&section))
                })
                .map(|(idx, _)| idx)
                .collect();
            if touching.is_empty() {
                fresh.push(id);
                continue;
            }
            for group_idx in touching {
                next_bottoms[group_idx].push(id);
                let root = self.frontline[group_idx].root;
                self.union(root, id);
            }
        }

        let previous = std::mem::take(&mut self.frontline);
        let mut merged: Vec<OpenGroup> = Vec::with_capacity(previous.len() + fresh.len());
        for (group, bottom) in previous.into_iter().zip(next_bottoms) {
            // nothing attached below: the group is closed for good
            if bottom.is_empty() {
                continue;
            }
            let root = self.find(group.root);
            if let Some(existing) = merged.iter_mut().find(|open| open.root == root) {
                for id in bottom {
                    if !existing.bottom.contains(&id) {
                        existing.bottom.push(id);
                    }
                }
            } else {
                merged.push(OpenGroup { root, bottom });
            }
        }
        for id in fresh {
            merged.push(OpenGroup {
                root: id,
                bottom: vec![id],
            });
        }
        self.frontline = merged;
    }

    /// Number of open groups; bounded by the width of the last row.
    pub fn frontline_len(&self) -> usize {
        self.frontline.len()
    }

    pub fn finish(mut self, gutter: i32) -> ReachabilityMap {
        for id in 0..self.sections.len() {
            let root = self.find(id);
            if self.inside[root] {
                self.sections[id].is_inside = true;
            }
        }
        let rows = self
            .row_bounds
            .iter()
            .map(|&(first, last)| self.sections[first..last].to_vec())
            .collect();
        ReachabilityMap { rows, gutter }
    }

    fn find(&mut self, id: usize) -> usize {
        let mut node = id;
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        self.parent[rb] = ra;
        self.inside[ra] = self.inside[ra] || self.inside[rb];
    }
}

/// Finalized per-row sections. x arguments and results are screen columns,
/// i.e. grid column plus the line-number gutter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReachabilityMap {
    rows: Vec<Vec<Section>>,
    gutter: i32,
}

impl ReachabilityMap {
    pub fn build<S: AsRef<str>>(rows: &[S], gutter: i32) -> Self {
        let mut builder = ReachabilityBuilder::new();
        for row in rows {
            builder.add_row(row.as_ref());
        }
        builder.finish(gutter)
    }

    pub fn sections(&self, row: i32) -> &[Section] {
        usize::try_from(row)
            .ok()
            .and_then(|row| self.rows.get(row))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_reachable(&self, x: i32, row: i32) -> bool {
        let Ok(column) = usize::try_from(x - self.gutter) else {
            return false;
        };
        self.sections(row)
            .iter()
            .find(|section| section.contains(column))
            .is_some_and(|section| section.is_inside)
    }

    pub fn first_reachable_index(&self, row: i32) -> Option<i32> {
        self.sections(row)
            .iter()
            .find(|section| section.is_inside)
            .map(|section| section.start as i32 + self.gutter)
    }

    pub fn last_reachable_index(&self, row: i32) -> Option<i32> {
        self.sections(row)
            .iter()
            .rev()
            .find(|section| section.is_inside)
            .map(|section| section.end as i32 + self.gutter)
    }

    pub fn has_reachable_cell(&self, row: i32) -> bool {
        self.first_reachable_index(row).is_some()
    }
}
