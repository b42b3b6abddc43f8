//! Scene reconciliation: replace-on-reimport for imported groups.
//!
//! A file's identity in the scene is its stem. Reconciling a stem destroys
//! every pre-existing group whose name contains it, then creates one fresh
//! group holding the file's meshes. The whole sequence runs under one lock,
//! so concurrent workers never interleave a destroy from one file with a
//! create from another.

use crate::error::ImportError;
use crate::scene::{GroupId, HostScene, ObjectId, SceneError};
use config::constants::SCENE_LOCK_TIMEOUT_MS;
use hkx_geometry::MeshBuffer;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;

/// A finished mesh waiting to be attached, named after its shape kind.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMesh {
    pub name: String,
    pub buffer: MeshBuffer,
}

/// The group one file produced in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportGroup {
    pub name: String,
    pub id: GroupId,
    pub objects: Vec<ObjectId>,
}

impl ImportGroup {
    pub fn mesh_count(&self) -> usize {
        self.objects.len()
    }
}

struct ReconcileState<S> {
    scene: S,
    /// Groups created since the last `begin_batch`.
    batch_groups: HashSet<GroupId>,
}

/// Serializes all group replacement against one host scene.
///
/// # Examples
/// ```
/// use hkx_import::reconcile::SceneReconciler;
/// use hkx_import::scene::InMemoryScene;
///
/// let reconciler = SceneReconciler::new(InMemoryScene::default());
/// reconciler.reconcile("rock", &[]).unwrap();
/// reconciler.reconcile("rock", &[]).unwrap();
/// assert_eq!(reconciler.with_scene(|scene| scene.group_count()), 1);
/// ```
pub struct SceneReconciler<S> {
    state: Mutex<ReconcileState<S>>,
    lock_timeout: Duration,
}

impl<S: HostScene> SceneReconciler<S> {
    pub fn new(scene: S) -> Self {
        Self {
            state: Mutex::new(ReconcileState {
                scene,
                batch_groups: HashSet::new(),
            }),
            lock_timeout: Duration::from_millis(SCENE_LOCK_TIMEOUT_MS),
        }
    }

    /// How long `reconcile` waits for the scene before reporting a conflict.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Starts a new batch. Groups created from here on are only replaced by
    /// an exact stem match until the next call.
    ///
    /// Takes `&mut self` so no batch can start while workers of another
    /// still hold the reconciler.
    pub fn begin_batch(&mut self) {
        self.state.get_mut().batch_groups.clear();
    }

    /// Replaces the scene's group for `stem` with one holding `meshes`.
    ///
    /// Meshes are linked in the given order. If attaching fails part way,
    /// the new group is destroyed again so the file leaves nothing behind.
    ///
    /// # Errors
    ///
    /// - [`ImportError::SceneConflict`] if the scene stays locked past the
    ///   lock timeout, or the stem's name is still taken after clean-up.
    /// - [`ImportError::Scene`] for any other host failure.
    pub fn reconcile(&self, stem: &str, meshes: &[NamedMesh]) -> Result<ImportGroup, ImportError> {
        let mut guard = self
            .state
            .try_lock_for(self.lock_timeout)
            .ok_or_else(|| ImportError::SceneConflict { stem: stem.to_string() })?;
        let state = &mut *guard;

        if stem.is_empty() {
            return Err(SceneError::Rejected("empty file stem".into()).into());
        }

        let stale: Vec<(GroupId, String)> = state
            .scene
            .groups()
            .into_iter()
            .filter(|(id, name)| {
                name.contains(stem) && (name == stem || !state.batch_groups.contains(id))
            })
            .collect();
        for (id, name) in stale {
            state.scene.destroy_group(id)?;
            state.batch_groups.remove(&id);
            log::info!("removed previous import group '{name}'");
        }

        let group = match state.scene.create_group(stem) {
            Ok(group) => group,
            Err(SceneError::NameTaken(_)) => {
                return Err(ImportError::SceneConflict { stem: stem.to_string() })
            }
            Err(err) => return Err(err.into()),
        };

        match populate(&mut state.scene, group, meshes) {
            Ok(objects) => {
                state.batch_groups.insert(group);
                Ok(ImportGroup {
                    name: stem.to_string(),
                    id: group,
                    objects,
                })
            }
            Err(err) => {
                if let Err(cleanup) = state.scene.destroy_group(group) {
                    log::warn!("could not roll back group '{stem}': {cleanup}");
                }
                Err(err.into())
            }
        }
    }

    /// Runs `f` with shared access to the scene.
    pub fn with_scene<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.lock().scene)
    }

    pub fn into_scene(self) -> S {
        self.state.into_inner().scene
    }
}

/// Creates, links and exposes every mesh. Objects created before a failure
/// are either linked (and go with the group) or destroyed here.
fn populate<S: HostScene>(
    scene: &mut S,
    group: GroupId,
    meshes: &[NamedMesh],
) -> Result<Vec<ObjectId>, SceneError> {
    let mut objects = Vec::with_capacity(meshes.len());
    for mesh in meshes {
        let object = scene.create_mesh(&mesh.name, mesh.buffer.clone())?;
        if let Err(err) = scene.link_object(group, object) {
            if let Err(cleanup) = scene.destroy_object(object) {
                log::warn!("could not remove unlinked object {object:?}: {cleanup}");
            }
            return Err(err);
        }
        objects.push(object);
    }
    scene.link_group(group)?;
    Ok(objects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::InMemoryScene;
    use glam::DVec3;
    use std::sync::Arc;
    use std::thread;

    fn mesh(name: &str, x: f64) -> NamedMesh {
        let mut buffer = MeshBuffer::new();
        buffer.add_vertex(DVec3::new(x, 0.0, 0.0));
        NamedMesh {
            name: name.to_string(),
            buffer,
        }
    }

    /// Scene whose n-th `create_mesh` call fails.
    struct FlakyScene {
        inner: InMemoryScene,
        fail_on: usize,
        created: usize,
    }

    impl HostScene for FlakyScene {
        fn groups(&self) -> Vec<(GroupId, String)> {
            self.inner.groups()
        }
        fn create_group(&mut self, name: &str) -> Result<GroupId, SceneError> {
            self.inner.create_group(name)
        }
        fn destroy_group(&mut self, group: GroupId) -> Result<(), SceneError> {
            self.inner.destroy_group(group)
        }
        fn create_mesh(&mut self, name: &str, buffer: MeshBuffer) -> Result<ObjectId, SceneError> {
            self.created += 1;
            if self.created == self.fail_on {
                return Err(SceneError::Rejected("out of memory".into()));
            }
            self.inner.create_mesh(name, buffer)
        }
        fn destroy_object(&mut self, object: ObjectId) -> Result<(), SceneError> {
            self.inner.destroy_object(object)
        }
        fn link_object(&mut self, group: GroupId, object: ObjectId) -> Result<(), SceneError> {
            self.inner.link_object(group, object)
        }
        fn link_group(&mut self, group: GroupId) -> Result<(), SceneError> {
            self.inner.link_group(group)
        }
    }

    #[test]
    fn reconcile_creates_linked_group() {
        let reconciler = SceneReconciler::new(InMemoryScene::default());
        let group = reconciler
            .reconcile("rock", &[mesh("hkpBoxShape", 1.0), mesh("hkpMeshShape", 2.0)])
            .unwrap();
        assert_eq!(group.name, "rock");
        assert_eq!(group.mesh_count(), 2);

        reconciler.with_scene(|scene| {
            let (_, stored) = scene.group_by_name("rock").unwrap();
            assert!(stored.linked);
            let objects = scene.objects_in("rock");
            let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
            assert_eq!(names, vec!["hkpBoxShape", "hkpMeshShape"]);
        });
    }

    #[test]
    fn reimport_replaces_group_and_meshes() {
        let mut reconciler = SceneReconciler::new(InMemoryScene::default());
        let first = reconciler.reconcile("rock", &[mesh("old", 1.0)]).unwrap();
        reconciler.begin_batch();
        let second = reconciler.reconcile("rock", &[mesh("new", 2.0)]).unwrap();

        assert_ne!(first.id, second.id);
        reconciler.with_scene(|scene| {
            assert_eq!(scene.group_count(), 1);
            assert_eq!(scene.object_count(), 1);
            assert!(scene.group(first.id).is_none());
            assert_eq!(scene.objects_in("rock")[0].name, "new");
        });
    }

    #[test]
    fn substring_match_replaces_earlier_imports() {
        let mut scene = InMemoryScene::default();
        scene.create_group("rock.001").unwrap();
        scene.create_group("bigrock").unwrap();
        scene.create_group("tree").unwrap();
        let reconciler = SceneReconciler::new(scene);

        reconciler.reconcile("rock", &[]).unwrap();
        reconciler.with_scene(|scene| {
            assert_eq!(scene.groups_matching("rock"), vec!["rock"]);
            assert!(scene.group_by_name("tree").is_some());
        });
    }

    #[test]
    fn same_batch_groups_survive_overlapping_stems() {
        let mut reconciler = SceneReconciler::new(InMemoryScene::default());
        reconciler.begin_batch();
        reconciler.reconcile("rockwall", &[mesh("a", 1.0)]).unwrap();
        reconciler.reconcile("rock", &[mesh("b", 2.0)]).unwrap();

        reconciler.with_scene(|scene| {
            assert!(scene.group_by_name("rockwall").is_some());
            assert!(scene.group_by_name("rock").is_some());
        });

        // A later batch treats both as pre-existing again.
        reconciler.begin_batch();
        reconciler.reconcile("rock", &[]).unwrap();
        reconciler.with_scene(|scene| assert_eq!(scene.groups_matching("rock"), vec!["rock"]));
    }

    #[test]
    fn failed_population_rolls_back() {
        let scene = FlakyScene {
            inner: InMemoryScene::default(),
            fail_on: 2,
            created: 0,
        };
        let reconciler = SceneReconciler::new(scene);
        let err = reconciler
            .reconcile("rock", &[mesh("a", 1.0), mesh("b", 2.0), mesh("c", 3.0)])
            .unwrap_err();

        assert!(matches!(err, ImportError::Scene(SceneError::Rejected(_))));
        reconciler.with_scene(|scene| {
            assert_eq!(scene.inner.group_count(), 0);
            assert_eq!(scene.inner.object_count(), 0);
        });
    }

    #[test]
    fn empty_stem_is_rejected() {
        let reconciler = SceneReconciler::new(InMemoryScene::default());
        assert!(matches!(
            reconciler.reconcile("", &[]),
            Err(ImportError::Scene(SceneError::Rejected(_)))
        ));
    }

    #[test]
    fn held_lock_reports_conflict() {
        let reconciler = Arc::new(
            SceneReconciler::new(InMemoryScene::default())
                .with_lock_timeout(Duration::from_millis(20)),
        );
        let guard = reconciler.state.lock();

        let contender = Arc::clone(&reconciler);
        let err = thread::spawn(move || contender.reconcile("rock", &[]).unwrap_err())
            .join()
            .unwrap();
        drop(guard);

        assert!(err.is_retryable());
        assert!(reconciler.reconcile("rock", &[]).is_ok());
    }

    #[test]
    fn concurrent_reconciles_keep_one_group_per_stem() {
        let mut reconciler = SceneReconciler::new(InMemoryScene::default());
        reconciler.begin_batch();
        let reconciler = Arc::new(reconciler);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reconciler = Arc::clone(&reconciler);
                thread::spawn(move || {
                    let stem = format!("field{}", i % 4);
                    reconciler.reconcile(&stem, &[mesh("m", i as f64)]).unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        reconciler.with_scene(|scene| {
            assert_eq!(scene.group_count(), 4);
            assert_eq!(scene.object_count(), 4);
        });
    }
}
