use crate::event::Event;

/// Restart an event source from its first event
pub trait Rewind {
    type Error;

    fn rewind(&mut self) -> Result<(), Self::Error>;
}

/// Derive additional information, e.g. new jet collections, for an event
pub trait Produce {
    fn produce(&self, event: &mut Event);
}

impl<P: Produce> Produce for [P] {
    fn produce(&self, event: &mut Event) {
        for producer in self {
            producer.produce(event)
        }
    }
}

impl<P: Produce> Produce for Vec<P> {
    fn produce(&self, event: &mut Event) {
        self.as_slice().produce(event)
    }
}
