use super::{GroupId, HostScene, ObjectId, SceneError};
use hkx_geometry::MeshBuffer;
use std::collections::BTreeMap;

/// A group held by [`InMemoryScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneGroup {
    pub name: String,
    pub members: Vec<ObjectId>,
    /// True once linked into the active scene.
    pub linked: bool,
}

/// A mesh object held by [`InMemoryScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub mesh: MeshBuffer,
    pub group: Option<GroupId>,
}

/// Host scene kept entirely in memory.
///
/// Group names are unique; creating a second group with a taken name fails
/// with [`SceneError::NameTaken`].
///
/// # Examples
/// ```
/// use hkx_import::scene::{HostScene, InMemoryScene};
/// let mut scene = InMemoryScene::default();
/// let id = scene.create_group("rock").unwrap();
/// assert!(scene.create_group("rock").is_err());
/// scene.destroy_group(id).unwrap();
/// assert_eq!(scene.group_count(), 0);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryScene {
    next_id: u64,
    groups: BTreeMap<GroupId, SceneGroup>,
    objects: BTreeMap<ObjectId, SceneObject>,
}

impl InMemoryScene {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn group(&self, id: GroupId) -> Option<&SceneGroup> {
        self.groups.get(&id)
    }

    /// Looks up a group by exact name.
    pub fn group_by_name(&self, name: &str) -> Option<(GroupId, &SceneGroup)> {
        self.groups
            .iter()
            .find(|(_, group)| group.name == name)
            .map(|(id, group)| (*id, group))
    }

    /// Names of all groups whose name contains `needle`.
    pub fn groups_matching(&self, needle: &str) -> Vec<String> {
        self.groups
            .values()
            .filter(|group| group.name.contains(needle))
            .map(|group| group.name.clone())
            .collect()
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    /// Objects linked into the group named `name`, in link order.
    pub fn objects_in(&self, name: &str) -> Vec<&SceneObject> {
        self.group_by_name(name)
            .map(|(_, group)| {
                group
                    .members
                    .iter()
                    .filter_map(|id| self.objects.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl HostScene for InMemoryScene {
    fn groups(&self) -> Vec<(GroupId, String)> {
        self.groups
            .iter()
            .map(|(id, group)| (*id, group.name.clone()))
            .collect()
    }

    fn create_group(&mut self, name: &str) -> Result<GroupId, SceneError> {
        if name.is_empty() {
            return Err(SceneError::Rejected("group name must not be empty".into()));
        }
        if self.groups.values().any(|group| group.name == name) {
            return Err(SceneError::NameTaken(name.to_string()));
        }
        let id = GroupId(self.allocate());
        self.groups.insert(
            id,
            SceneGroup {
                name: name.to_string(),
                members: Vec::new(),
                linked: false,
            },
        );
        Ok(id)
    }

    fn destroy_group(&mut self, group: GroupId) -> Result<(), SceneError> {
        let removed = self
            .groups
            .remove(&group)
            .ok_or(SceneError::UnknownGroup(group))?;
        for member in removed.members {
            self.objects.remove(&member);
        }
        Ok(())
    }

    fn create_mesh(&mut self, name: &str, buffer: MeshBuffer) -> Result<ObjectId, SceneError> {
        let id = ObjectId(self.allocate());
        self.objects.insert(
            id,
            SceneObject {
                name: name.to_string(),
                mesh: buffer,
                group: None,
            },
        );
        Ok(id)
    }

    fn destroy_object(&mut self, object: ObjectId) -> Result<(), SceneError> {
        match self.objects.get(&object) {
            None => Err(SceneError::UnknownObject(object)),
            Some(obj) if obj.group.is_some() => Err(SceneError::Rejected(format!(
                "object {object:?} is still linked"
            ))),
            Some(_) => {
                self.objects.remove(&object);
                Ok(())
            }
        }
    }

    fn link_object(&mut self, group: GroupId, object: ObjectId) -> Result<(), SceneError> {
        let obj = self
            .objects
            .get_mut(&object)
            .ok_or(SceneError::UnknownObject(object))?;
        let target = self
            .groups
            .get_mut(&group)
            .ok_or(SceneError::UnknownGroup(group))?;
        if obj.group.is_some() {
            return Err(SceneError::Rejected(format!(
                "object {object:?} is already linked"
            )));
        }
        obj.group = Some(group);
        target.members.push(object);
        Ok(())
    }

    fn link_group(&mut self, group: GroupId) -> Result<(), SceneError> {
        let target = self
            .groups
            .get_mut(&group)
            .ok_or(SceneError::UnknownGroup(group))?;
        target.linked = true;
        Ok(())
    }
}
