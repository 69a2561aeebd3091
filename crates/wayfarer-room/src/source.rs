//! Where fresh worlds come from.

use wayfarer_protocol::RoomId;
use wayfarer_world::LocationGraph;

/// Builds the location graph for a room that has no save file.
///
/// This is the content seam: the room layer never decides what a world
/// looks like, only how a party moves and fights through it. Any
/// `Fn(&RoomId) -> LocationGraph` closure is a source.
pub trait WorldSource: Send + Sync + 'static {
    fn build(&self, room: &RoomId) -> LocationGraph;
}

impl<F> WorldSource for F
where
    F: Fn(&RoomId) -> LocationGraph + Send + Sync + 'static,
{
    fn build(&self, room: &RoomId) -> LocationGraph {
        self(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_world::Location;

    #[test]
    fn test_closure_is_a_source() {
        let source = |room: &RoomId| LocationGraph::new(Location::new(room.as_str(), "Start", "start"));
        let graph = source.build(&RoomId::from("alpha"));
        assert_eq!(graph.get(graph.start()).unwrap().id, "alpha");
    }
}
