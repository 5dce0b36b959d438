use log::debug;

use super::osm::{Coordinate, Polyline};

/// The assembled outline of one region: continuous chains in placement order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Border {
    pub chains: Vec<Polyline>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    After,
    Before,
    FlipAfter,
    FlipBefore,
}

/// Reverses the point order of a polyline.
pub fn flip(polyline: &[Coordinate]) -> Polyline {
    polyline.iter().rev().cloned().collect()
}

fn is_reverse_of(a: &[Coordinate], b: &[Coordinate]) -> bool {
    a.len() == b.len() && a.iter().eq(b.iter().rev())
}

fn same_way(a: &[Coordinate], b: &[Coordinate]) -> bool {
    a == b || is_reverse_of(a, b)
}

/// Where `candidate` attaches to `chain`, checked in fixed priority order.
/// Both must be non-empty.
fn placement(chain: &[Coordinate], candidate: &[Coordinate]) -> Option<Placement> {
    let chain_first = &chain[0];
    let chain_last = &chain[chain.len() - 1];
    let candidate_first = &candidate[0];
    let candidate_last = &candidate[candidate.len() - 1];

    // The flipped candidate starts with its last point and ends with its first.
    if chain_last == candidate_first {
        Some(Placement::After)
    } else if candidate_last == chain_first {
        Some(Placement::Before)
    } else if chain_last == candidate_last {
        Some(Placement::FlipAfter)
    } else if candidate_first == chain_first {
        Some(Placement::FlipBefore)
    } else {
        None
    }
}

fn attach(chain: &mut Polyline, candidate: &[Coordinate], placement: Placement) {
    match placement {
        Placement::After => chain.extend_from_slice(candidate),
        Placement::Before => {
            chain.splice(0..0, candidate.iter().cloned());
        },
        Placement::FlipAfter => chain.extend(candidate.iter().rev().cloned()),
        Placement::FlipBefore => {
            chain.splice(0..0, candidate.iter().rev().cloned());
        },
    }
}

impl Border {
    /// Stitches the member ways of a region into continuous chains.
    ///
    /// Members are visited in order. Each member not yet used starts a chain,
    /// which then absorbs any unused member sharing an endpoint with it (possibly
    /// reversed) until a whole pass adds nothing. A chain that absorbed nothing
    /// is dropped, unless it is the only non-empty member of the region. A way
    /// listed twice counts as two members, so it is dropped as well. Disjoint
    /// rings therefore do not all survive.
    pub fn assemble(name: &str, members: &[&[Coordinate]]) -> Border {
        let lone_member = members.iter().filter(|member| !member.is_empty()).count() == 1;
        let mut distinct: Vec<&[Coordinate]> = Vec::with_capacity(members.len());
        for member in members.iter().copied() {
            if member.is_empty() || distinct.iter().any(|seen| same_way(seen, member)) {
                continue;
            }
            distinct.push(member);
        }

        let mut used = vec![false; distinct.len()];
        let mut chains: Vec<Polyline> = Vec::new();
        let mut kept = 0;

        for start in 0..distinct.len() {
            if used[start] {
                continue;
            }
            let mut chain = distinct[start].to_vec();
            let mut pieces = vec![start];

            loop {
                let mut grew = false;
                for (index, candidate) in distinct.iter().enumerate() {
                    if used[index] || pieces.contains(&index) {
                        continue;
                    }
                    if let Some(side) = placement(&chain, candidate) {
                        attach(&mut chain, candidate, side);
                        pieces.push(index);
                        grew = true;
                    }
                }
                if !grew {
                    break;
                }
            }

            if pieces.len() > 1 || lone_member {
                for index in &pieces {
                    used[*index] = true;
                }
                kept += pieces.len();
                chains.push(chain);
            }
        }

        debug!(region = name, kept = kept, total = members.len(); "Assembled border");
        Border { chains }
    }

    /// Newline-joined coordinate lines, chains back to back.
    pub fn content(&self) -> String {
        self.chains
            .iter()
            .flatten()
            .map(Coordinate::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
