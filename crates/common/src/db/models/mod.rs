//! SeaORM entity models

mod paper;
mod user;

pub use paper::{
    Entity as PaperEntity,
    Model as PaperRecord,
    ActiveModel as PaperActiveModel,
    Column as PaperColumn,
};

pub use user::{
    Entity as UserEntity,
    Model as UserAccount,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};
