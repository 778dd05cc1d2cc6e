mod component;
mod entity;
mod field;
mod method;
mod schema;

pub use component::ComponentDescriptor;
pub use entity::EntityDefinition;
pub use field::FieldDescriptor;
pub use method::{MethodDescriptor, Receiver};
pub use schema::Schema;
