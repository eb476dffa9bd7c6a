/// Receives the dirty signal of a replicated field. `field_index` identifies
/// the field within its owner.
pub trait FieldMutate: FieldMutateClone {
    /// Marks the field as dirty, returning whether the signal was delivered
    fn mutate(&mut self, field_index: u8) -> bool;
}

pub trait FieldMutateClone {
    fn clone_box(&self) -> Box<dyn FieldMutate>;
}

impl<T: 'static + Clone + FieldMutate> FieldMutateClone for T {
    fn clone_box(&self) -> Box<dyn FieldMutate> {
        Box::new(self.clone())
    }
}

/// Handle through which a collection raises its dirty signal
pub struct FieldMutator {
    inner: Box<dyn FieldMutate>,
}

impl FieldMutator {
    pub fn new<M: 'static + FieldMutate>(mutator: M) -> Self {
        Self {
            inner: Box::new(mutator),
        }
    }

    pub fn mutate(&mut self, field_index: u8) -> bool {
        self.inner.mutate(field_index)
    }

    pub fn clone_new(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}
