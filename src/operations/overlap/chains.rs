use slotmap::{new_key_type, SlotMap};
use tracing::debug;

use super::descriptor::Mask;
use super::outline::{Direction, Sample};
use crate::error::{MaskError, Result};
use crate::geometry::Polygon;
use crate::math::{self, Point2};

new_key_type! {
    /// Identifier of a node in a [`ChainArena`].
    pub(crate) struct NodeId;
}

/// A point of this image's amended margin or of the other image's
/// projected outline.
///
/// Margin nodes are linked both ways through `left` and `right`. Outline
/// nodes are linked forward through `next`. Crossing nodes belong to both.
#[derive(Debug, Clone)]
struct ChainNode {
    pos: Point2,
    direction: Option<Direction>,
    next: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    used: bool,
}

impl ChainNode {
    fn new(pos: Point2, direction: Option<Direction>) -> Self {
        Self {
            pos,
            direction,
            next: None,
            left: None,
            right: None,
            used: false,
        }
    }
}

/// Which margin link to follow after an `Out` crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Turn {
    /// Back along the margin; yields exclude masks.
    Left,
    /// Forward along the margin; yields include masks.
    Right,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Next,
    Margin(Turn),
}

/// Arena holding the linked margin and outline chains of one image pair.
pub(crate) struct ChainArena {
    nodes: SlotMap<NodeId, ChainNode>,
    /// `In` crossings in margin order.
    entries: Vec<NodeId>,
    delta: f64,
}

impl ChainArena {
    /// Links the other image's projected outline with this image's margin.
    ///
    /// `outline` must start at an `In` crossing. Every crossing twin is
    /// inserted into `margin`.
    ///
    /// # Errors
    ///
    /// Returns `MaskError::InsertionFailed` if a crossing does not lie on
    /// the margin, or `MaskError::BrokenChain` if a recorded sample has no
    /// projection.
    pub(crate) fn build(outline: &[Sample], margin: &mut Polygon, delta: f64) -> Result<Self> {
        let mut nodes = SlotMap::with_key();
        let mut crossings = Vec::new();
        let mut previous: Option<NodeId> = None;
        let mut record = false;

        for sample in outline {
            if sample.direction == Some(Direction::In) {
                previous = None;
                record = true;
            }
            if record {
                let twin = sample.twin.ok_or_else(|| {
                    MaskError::BrokenChain(format!(
                        "sample ({:.3}, {:.3}) inside without projection",
                        sample.pos.x, sample.pos.y
                    ))
                })?;
                let id = nodes.insert(ChainNode::new(twin, sample.direction));
                if let Some(prev) = previous {
                    nodes[prev].next = Some(id);
                }
                if sample.direction.is_some() {
                    crossings.push(id);
                }
                previous = Some(id);
            }
            if sample.direction == Some(Direction::Out) {
                record = false;
            }
        }

        let mut marks: Vec<Option<NodeId>> = vec![None; margin.count()];
        for &id in &crossings {
            let p = nodes[id].pos;
            let index = margin
                .take_in_at(p, delta)
                .ok_or(MaskError::InsertionFailed { x: p.x, y: p.y })?;
            marks.insert(index, Some(id));
        }

        let ring: Vec<NodeId> = margin
            .vertices()
            .zip(marks)
            .map(|(pos, mark)| mark.unwrap_or_else(|| nodes.insert(ChainNode::new(pos, None))))
            .collect();
        let mut entries = Vec::new();
        for (i, &id) in ring.iter().enumerate() {
            let right = ring[(i + 1) % ring.len()];
            nodes[id].right = Some(right);
            nodes[right].left = Some(id);
            if nodes[id].direction == Some(Direction::In) {
                entries.push(id);
            }
        }
        debug!(
            crossings = crossings.len(),
            margin_vertices = ring.len(),
            "linked overlap chains"
        );

        Ok(Self {
            nodes,
            entries,
            delta,
        })
    }

    /// Number of nodes in the arena.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Walks closed loops starting at each unused `In` crossing: along the
    /// outline chain until the next `Out`, then along the margin in the
    /// `turn` direction until the next `In`, and so on back to the start.
    ///
    /// # Errors
    ///
    /// Returns `MaskError::BrokenChain` if a link is missing or a loop does
    /// not close.
    pub(crate) fn walk(&mut self, turn: Turn) -> Result<Vec<Mask>> {
        for &id in &self.entries {
            self.nodes[id].used = false;
        }
        let limit = self.nodes.len();
        let mut masks = Vec::new();

        for &start in &self.entries {
            if self.nodes[start].used {
                continue;
            }
            let mut points: Vec<Point2> = Vec::new();
            let mut step = Step::Next;
            let mut at = start;
            let mut steps = 0;
            loop {
                let node = self
                    .nodes
                    .get_mut(at)
                    .ok_or_else(|| MaskError::BrokenChain("dangling node".into()))?;
                if points
                    .last()
                    .is_none_or(|last| math::distance(last, &node.pos) >= self.delta)
                {
                    points.push(node.pos);
                }
                match node.direction {
                    Some(Direction::Out) => step = Step::Margin(turn),
                    Some(Direction::In) => {
                        node.used = true;
                        step = Step::Next;
                    }
                    None => {}
                }
                let link = match step {
                    Step::Next => node.next,
                    Step::Margin(Turn::Left) => node.left,
                    Step::Margin(Turn::Right) => node.right,
                };
                at = link.ok_or_else(|| {
                    MaskError::BrokenChain(format!(
                        "no {step:?} link at ({:.3}, {:.3})",
                        node.pos.x, node.pos.y
                    ))
                })?;
                if at == start {
                    break;
                }
                steps += 1;
                if steps > limit {
                    return Err(MaskError::BrokenChain(format!(
                        "{turn:?} walk does not return to its start"
                    ))
                    .into());
                }
            }
            if points.len() > 1
                && math::distance(&points[0], &points[points.len() - 1]) < self.delta
            {
                points.pop();
            }
            masks.push(Mask::new(points));
        }
        Ok(masks)
    }
}
