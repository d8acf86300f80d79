//! Traffic mix: which task a simulated user runs next, and how often.
use crate::error::ConfigError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    ListProducts,
    GetProductById,
    ListCategories,
    CreateProduct,
    ListUsers,
    CreateUser,
    ListOrders,
    CreateOrder,
}

#[derive(Debug, Clone, Copy)]
pub struct Task {
    pub kind: TaskKind,
    pub weight: u32,
}

/// Relative weights; a task with weight 10 is picked five times as often as one with weight 2.
pub const TASKS: [Task; 8] = [
    Task {
        kind: TaskKind::ListProducts,
        weight: 10,
    },
    Task {
        kind: TaskKind::GetProductById,
        weight: 5,
    },
    Task {
        kind: TaskKind::ListCategories,
        weight: 3,
    },
    Task {
        kind: TaskKind::CreateProduct,
        weight: 2,
    },
    Task {
        kind: TaskKind::ListUsers,
        weight: 8,
    },
    Task {
        kind: TaskKind::CreateUser,
        weight: 3,
    },
    Task {
        kind: TaskKind::ListOrders,
        weight: 6,
    },
    Task {
        kind: TaskKind::CreateOrder,
        weight: 2,
    },
];

#[derive(Debug, Clone)]
pub struct TaskPicker {
    kinds: Vec<TaskKind>,
    index: WeightedIndex<u32>,
}

impl TaskPicker {
    pub fn new(tasks: &[Task]) -> Result<Self, ConfigError> {
        let index = WeightedIndex::new(tasks.iter().map(|t| t.weight))?;
        Ok(Self {
            kinds: tasks.iter().map(|t| t.kind).collect(),
            index,
        })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> TaskKind {
        self.kinds[self.index.sample(rng)]
    }
}
