pub type Generation = u32;

/// One arena cell. A vacant slot remembers the next vacant index so the free
/// slots form an intrusive list.
#[derive(Debug)]
pub enum Slot<T> {
    Occupied(Generation, T),
    Vacant(Generation, Option<usize>),
}

impl<T> Slot<T> {
    pub fn new(gen: Generation, t: T) -> Self {
        Slot::Occupied(gen, t)
    }

    pub fn generation(&self) -> Generation {
        match self {
            Slot::Occupied(gen, _) => *gen,
            Slot::Vacant(gen, _) => *gen,
        }
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied(_, _))
    }

    pub fn next_vacant_exn(&self) -> Option<usize> {
        match self {
            Slot::Vacant(_, next) => *next,
            Slot::Occupied(_, _) => panic!("expected vacant slot"),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Slot::Occupied(_, t) => Some(t),
            Slot::Vacant(_, _) => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Slot::Occupied(_, t) => Some(t),
            Slot::Vacant(_, _) => None,
        }
    }

    /// Vacates the slot, bumping its generation, and hands back the value.
    pub fn vacate(&mut self, next_vacant: Option<usize>) -> Option<T> {
        let gen = self.generation().wrapping_add(1);
        match std::mem::replace(self, Slot::Vacant(gen, next_vacant)) {
            Slot::Occupied(_, t) => Some(t),
            vacant @ Slot::Vacant(_, _) => {
                *self = vacant;
                None
            }
        }
    }

    pub fn value_exn(&self) -> &T {
        self.value().expect("expected occupied slot")
    }

    pub fn value_mut_exn(&mut self) -> &mut T {
        self.value_mut().expect("expected occupied slot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vacate_bumps_generation() {
        let mut slot = Slot::new(3, "x");
        assert_eq!(slot.vacate(None), Some("x"));
        assert_eq!(slot.generation(), 4);
        assert!(!slot.is_occupied());
        assert_eq!(slot.next_vacant_exn(), None);
    }

    #[test]
    fn vacate_twice_is_noop() {
        let mut slot = Slot::new(0, 1u8);
        slot.vacate(Some(7));
        assert_eq!(slot.vacate(None), None);
        assert_eq!(slot.generation(), 1);
        assert_eq!(slot.next_vacant_exn(), Some(7));
    }
}
