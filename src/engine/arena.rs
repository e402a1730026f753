use super::EngineError;

/// Fixed byte budget that the engine's weights, buffers, and activations are carved from.
#[derive(Debug, Clone)]
pub struct Arena {
    capacity: usize,
    used: usize,
}

impl Arena {
    pub fn new(capacity: usize) -> Self {
        Arena { capacity, used: 0 }
    }

    /// Claims `bytes` for `what`, failing without side effects if the budget is exceeded.
    pub fn reserve(&mut self, what: &'static str, bytes: usize) -> Result<(), EngineError> {
        let available = self.remaining();
        if bytes > available {
            return Err(EngineError::ArenaExhausted {
                what,
                requested: bytes,
                available,
            });
        }
        self.used += bytes;
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }
}
