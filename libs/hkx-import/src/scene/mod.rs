//! Host scene abstraction used by the reconciler.
//!
//! The importer never owns the host application's scene graph; it drives it
//! through [`HostScene`]. [`InMemoryScene`] implements the trait without a
//! host and backs the tests and the command-line tool.

mod memory;

pub use memory::{InMemoryScene, SceneGroup, SceneObject};

use hkx_geometry::MeshBuffer;
use thiserror::Error;

/// Handle to a group (collection) in the host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);

/// Handle to a mesh object in the host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Error raised by a host scene operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    /// The group handle does not exist.
    #[error("unknown group {0:?}")]
    UnknownGroup(GroupId),
    /// The object handle does not exist.
    #[error("unknown object {0:?}")]
    UnknownObject(ObjectId),
    /// A group with this exact name already exists.
    #[error("group name '{0}' is already taken")]
    NameTaken(String),
    /// The host refused the operation.
    #[error("host rejected operation: {0}")]
    Rejected(String),
}

/// Operations the importer needs from a host scene.
///
/// Implementations are driven from one thread at a time; the reconciler
/// serializes every call behind its own lock.
///
/// # Examples
/// ```
/// use hkx_import::scene::{HostScene, InMemoryScene};
/// use hkx_geometry::MeshBuffer;
///
/// let mut scene = InMemoryScene::default();
/// let group = scene.create_group("rock").unwrap();
/// let mesh = scene.create_mesh("hkpBoxShape", MeshBuffer::new()).unwrap();
/// scene.link_object(group, mesh).unwrap();
/// scene.link_group(group).unwrap();
/// assert_eq!(scene.groups(), vec![(group, "rock".to_string())]);
/// ```
pub trait HostScene {
    /// Enumerates existing groups with their names.
    fn groups(&self) -> Vec<(GroupId, String)>;

    /// Creates an empty, unlinked group.
    fn create_group(&mut self, name: &str) -> Result<GroupId, SceneError>;

    /// Destroys a group together with every object linked into it.
    fn destroy_group(&mut self, group: GroupId) -> Result<(), SceneError>;

    /// Creates a mesh object from a finished buffer.
    fn create_mesh(&mut self, name: &str, buffer: MeshBuffer) -> Result<ObjectId, SceneError>;

    /// Destroys an object that is not linked into any group.
    fn destroy_object(&mut self, object: ObjectId) -> Result<(), SceneError>;

    /// Links an object into a group.
    fn link_object(&mut self, group: GroupId, object: ObjectId) -> Result<(), SceneError>;

    /// Links a group into the active scene, making it visible.
    fn link_group(&mut self, group: GroupId) -> Result<(), SceneError>;
}
