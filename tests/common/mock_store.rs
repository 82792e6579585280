//! In-memory git store for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use chunk_push::error::{Error, Result};
use chunk_push::repo::GitStore;
use chunk_push::types::{CommitId, ObjectId, PushRequest, RefEntry};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// A commit in the mock history
#[derive(Debug, Clone)]
pub struct MockCommit {
    pub id: CommitId,
    pub parents: Vec<CommitId>,
    /// Objects introduced or referenced by this commit, with disk sizes
    pub objects: Vec<(ObjectId, u64)>,
}

/// Record of one `push` call
#[derive(Debug, Clone)]
pub struct PushCall {
    pub request: PushRequest,
    /// Bytes of objects the remote did not have yet
    pub new_bytes: u64,
    pub accepted: bool,
}

/// Mock git store with an explicit commit DAG
///
/// This manually implements `GitStore`, mirroring how the remote would
/// react to each push.
///
/// Features:
/// - Commits added in topological order (oldest first)
/// - Local and remote ref namespaces, remote object set
/// - Call tracking for verification
/// - Rejection injection (next N pushes, by destination, by size)
pub struct MockGitStore {
    commits: Vec<MockCommit>,
    index: HashMap<CommitId, usize>,
    sizes: HashMap<ObjectId, u64>,
    remotes: Vec<String>,
    current_branch: Mutex<Option<String>>,
    local_refs: Mutex<BTreeMap<String, CommitId>>,
    remote_refs: Mutex<BTreeMap<String, CommitId>>,
    remote_objects: Mutex<HashSet<ObjectId>>,
    // Call tracking
    push_calls: Mutex<Vec<PushCall>>,
    estimate_calls: Mutex<usize>,
    // Rejection injection
    reject_next: Mutex<usize>,
    reject_dests: Mutex<HashSet<String>>,
    remote_size_limit: Mutex<Option<u64>>,
}

impl Default for MockGitStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGitStore {
    /// Empty history, remote `origin`, on branch `main`
    pub fn new() -> Self {
        Self {
            commits: Vec::new(),
            index: HashMap::new(),
            sizes: HashMap::new(),
            remotes: vec!["origin".to_string()],
            current_branch: Mutex::new(Some("main".to_string())),
            local_refs: Mutex::new(BTreeMap::new()),
            remote_refs: Mutex::new(BTreeMap::new()),
            remote_objects: Mutex::new(HashSet::new()),
            push_calls: Mutex::new(Vec::new()),
            estimate_calls: Mutex::new(0),
            reject_next: Mutex::new(0),
            reject_dests: Mutex::new(HashSet::new()),
            remote_size_limit: Mutex::new(None),
        }
    }

    // === History construction ===

    /// Add a commit with the given parents and `(object name, size)` pairs
    ///
    /// Object names are scoped to the mock, so reusing a name shares the
    /// object between commits. The commit object itself weighs nothing.
    pub fn add_commit(&mut self, parents: &[&CommitId], objects: &[(&str, u64)]) -> CommitId {
        let id = CommitId::new(format!("{:040x}", self.commits.len() + 1));
        for parent in parents {
            assert!(self.index.contains_key(*parent), "unknown parent {parent}");
        }

        let mut commit_objects = vec![(ObjectId::new(id.as_str()), 0)];
        self.sizes.insert(ObjectId::new(id.as_str()), 0);
        for (name, size) in objects {
            let oid = ObjectId::new(format!("obj-{name}"));
            if let Some(existing) = self.sizes.get(&oid) {
                assert_eq!(existing, size, "object {name} reused with a different size");
            }
            self.sizes.insert(oid.clone(), *size);
            commit_objects.push((oid, *size));
        }

        self.index.insert(id.clone(), self.commits.len());
        self.commits.push(MockCommit {
            id: id.clone(),
            parents: parents.iter().map(|p| (*p).clone()).collect(),
            objects: commit_objects,
        });
        id
    }

    /// Add a commit on top of `parent` carrying one blob of `size` bytes
    pub fn add_sized_commit(&mut self, parent: Option<&CommitId>, size: u64) -> CommitId {
        let name = format!("blob-{}", self.commits.len() + 1);
        let parents: Vec<&CommitId> = parent.into_iter().collect();
        self.add_commit(&parents, &[(name.as_str(), size)])
    }

    // === State setup ===

    pub fn set_local_ref(&self, name: &str, commit: &CommitId) {
        self.local_refs
            .lock()
            .unwrap()
            .insert(name.to_string(), commit.clone());
    }

    pub fn set_remote_ref(&self, name: &str, commit: &CommitId) {
        self.remote_refs
            .lock()
            .unwrap()
            .insert(name.to_string(), commit.clone());
    }

    /// Pretend the remote already holds everything reachable from `commit`
    pub fn mark_on_remote(&self, commit: &CommitId) {
        let objects = self.objects_of(&self.ancestors(std::slice::from_ref(commit)));
        self.remote_objects.lock().unwrap().extend(objects);
    }

    pub fn set_current_branch(&self, branch: Option<&str>) {
        *self.current_branch.lock().unwrap() = branch.map(ToString::to_string);
    }

    pub fn add_remote(&mut self, name: &str) {
        self.remotes.push(name.to_string());
    }

    // === Rejection injection ===

    /// Reject the next `n` pushes regardless of content
    pub fn reject_next_pushes(&self, n: usize) {
        *self.reject_next.lock().unwrap() = n;
    }

    /// Always reject pushes whose destination is `dest`
    pub fn reject_pushes_to(&self, dest: &str) {
        self.reject_dests.lock().unwrap().insert(dest.to_string());
    }

    /// Reject pushes carrying more than `limit` bytes of new objects
    pub fn set_remote_size_limit(&self, limit: u64) {
        *self.remote_size_limit.lock().unwrap() = Some(limit);
    }

    // === Call verification ===

    pub fn push_calls(&self) -> Vec<PushCall> {
        self.push_calls.lock().unwrap().clone()
    }

    pub fn accepted_pushes(&self) -> Vec<PushCall> {
        self.push_calls().into_iter().filter(|c| c.accepted).collect()
    }

    pub fn estimate_calls(&self) -> usize {
        *self.estimate_calls.lock().unwrap()
    }

    pub fn local_refs_under(&self, prefix: &str) -> Vec<String> {
        self.local_refs
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn remote_refs_under(&self, prefix: &str) -> Vec<String> {
        self.remote_refs
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn remote_ref(&self, name: &str) -> Option<CommitId> {
        self.remote_refs.lock().unwrap().get(name).cloned()
    }

    /// Bytes of all objects in the history
    pub fn total_size(&self) -> u64 {
        self.sizes.values().sum()
    }

    /// Bytes of objects the remote holds
    pub fn remote_size(&self) -> u64 {
        self.remote_objects
            .lock()
            .unwrap()
            .iter()
            .map(|o| self.sizes[o])
            .sum()
    }

    // === Graph helpers ===

    fn lookup(&self, commit: &CommitId) -> Result<usize> {
        self.index
            .get(commit)
            .copied()
            .ok_or_else(|| Error::Git(format!("bad revision {commit}")))
    }

    fn ancestors(&self, tips: &[CommitId]) -> HashSet<usize> {
        let mut seen = HashSet::new();
        let mut stack: Vec<usize> = tips.iter().filter_map(|t| self.index.get(t).copied()).collect();
        while let Some(i) = stack.pop() {
            if seen.insert(i) {
                for parent in &self.commits[i].parents {
                    stack.push(self.index[parent]);
                }
            }
        }
        seen
    }

    fn objects_of(&self, commits: &HashSet<usize>) -> HashSet<ObjectId> {
        commits
            .iter()
            .flat_map(|i| self.commits[*i].objects.iter().map(|(o, _)| o.clone()))
            .collect()
    }

    fn range(&self, tip: &CommitId, excluding: &[CommitId]) -> Result<Vec<usize>> {
        self.lookup(tip)?;
        for commit in excluding {
            self.lookup(commit)?;
        }
        let included = self.ancestors(std::slice::from_ref(tip));
        let excluded = self.ancestors(excluding);
        let mut range: Vec<usize> = included.difference(&excluded).copied().collect();
        range.sort_unstable();
        Ok(range)
    }

    fn resolve(&self, name: &str) -> Option<CommitId> {
        let refs = self.local_refs.lock().unwrap();
        if name == "HEAD" {
            let branch = self.current_branch.lock().unwrap().clone()?;
            return refs.get(&format!("refs/heads/{branch}")).cloned();
        }
        refs.get(name)
            .or_else(|| refs.get(&format!("refs/heads/{name}")))
            .cloned()
            .or_else(|| {
                let id = CommitId::new(name);
                self.index.contains_key(&id).then_some(id)
            })
    }

    fn should_reject(&self, request: &PushRequest, new_bytes: u64) -> bool {
        let mut next = self.reject_next.lock().unwrap();
        if *next > 0 {
            *next -= 1;
            return true;
        }
        if self
            .reject_dests
            .lock()
            .unwrap()
            .contains(&request.destination())
        {
            return true;
        }
        self.remote_size_limit
            .lock()
            .unwrap()
            .is_some_and(|limit| new_bytes > limit)
    }
}

#[async_trait]
impl GitStore for MockGitStore {
    async fn resolve_ref(&self, name: &str) -> Result<CommitId> {
        self.resolve(name)
            .ok_or_else(|| Error::RefNotFound(name.to_string()))
    }

    async fn current_branch(&self) -> Result<String> {
        self.current_branch
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::Precondition("HEAD is detached".to_string()))
    }

    async fn remote_names(&self) -> Result<Vec<String>> {
        Ok(self.remotes.clone())
    }

    async fn list_refs(&self, prefix: &str) -> Result<Vec<RefEntry>> {
        Ok(self
            .local_refs
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, commit)| RefEntry {
                name: name.clone(),
                commit: commit.clone(),
            })
            .collect())
    }

    async fn list_remote_refs(&self, _remote: &str, prefix: &str) -> Result<Vec<RefEntry>> {
        Ok(self
            .remote_refs
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, commit)| RefEntry {
                name: name.clone(),
                commit: commit.clone(),
            })
            .collect())
    }

    async fn commits_between(
        &self,
        tip: &CommitId,
        excluding: &[CommitId],
    ) -> Result<Vec<CommitId>> {
        Ok(self
            .range(tip, excluding)?
            .into_iter()
            .map(|i| self.commits[i].id.clone())
            .collect())
    }

    async fn reachable_objects(
        &self,
        tip: &CommitId,
        excluding: &[CommitId],
    ) -> Result<Vec<ObjectId>> {
        *self.estimate_calls.lock().unwrap() += 1;
        let range: HashSet<usize> = self.range(tip, excluding)?.into_iter().collect();
        let excluded = self.objects_of(&self.ancestors(excluding));
        let mut objects: Vec<ObjectId> = self
            .objects_of(&range)
            .into_iter()
            .filter(|o| !excluded.contains(o))
            .collect();
        objects.sort();
        Ok(objects)
    }

    async fn object_disk_sizes(&self, objects: &[ObjectId]) -> Result<Vec<u64>> {
        objects
            .iter()
            .map(|o| {
                self.sizes
                    .get(o)
                    .copied()
                    .ok_or_else(|| Error::Git(format!("object {o} is missing")))
            })
            .collect()
    }

    async fn update_ref(&self, name: &str, commit: &CommitId) -> Result<()> {
        self.lookup(commit)?;
        self.set_local_ref(name, commit);
        Ok(())
    }

    async fn delete_ref(&self, name: &str) -> Result<()> {
        self.local_refs
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::Git(format!("no such ref {name}")))
    }

    async fn push(&self, request: &PushRequest) -> Result<()> {
        if !self.remotes.contains(&request.remote) {
            return Err(Error::Git(format!("no such remote {}", request.remote)));
        }

        // Resolve plain updates; wildcard specs are handled at prune time
        let mut updates = Vec::new();
        let mut new_objects = HashSet::new();
        for spec in &request.refspecs {
            match &spec.src {
                Some(src) if src.ends_with("/*") => {}
                Some(src) => {
                    let commit = self
                        .resolve(src)
                        .ok_or_else(|| Error::Git(format!("src refspec {src} does not match any")))?;
                    new_objects.extend(self.objects_of(&self.ancestors(std::slice::from_ref(&commit))));
                    updates.push((spec.dst.clone(), Some(commit)));
                }
                None => updates.push((spec.dst.clone(), None)),
            }
        }
        {
            let remote_objects = self.remote_objects.lock().unwrap();
            new_objects.retain(|o| !remote_objects.contains(o));
        }
        let new_bytes: u64 = new_objects.iter().map(|o| self.sizes[o]).sum();

        let accepted = !self.should_reject(request, new_bytes);
        self.push_calls.lock().unwrap().push(PushCall {
            request: request.clone(),
            new_bytes,
            accepted,
        });
        if !accepted {
            return Err(Error::TransferRejected {
                dest: request.destination(),
                message: "remote rejected".to_string(),
            });
        }

        self.remote_objects.lock().unwrap().extend(new_objects);
        let mut remote_refs = self.remote_refs.lock().unwrap();
        for (dst, commit) in updates {
            match commit {
                Some(commit) => {
                    remote_refs.insert(dst, commit);
                }
                None => {
                    remote_refs.remove(&dst);
                }
            }
        }

        for spec in &request.refspecs {
            let Some(src) = spec.src.as_deref() else {
                continue;
            };
            let (Some(src_prefix), Some(dst_prefix)) =
                (src.strip_suffix('*'), spec.dst.strip_suffix('*'))
            else {
                continue;
            };
            let local: BTreeMap<String, CommitId> = self
                .local_refs
                .lock()
                .unwrap()
                .iter()
                .filter_map(|(name, commit)| {
                    name.strip_prefix(src_prefix)
                        .map(|rest| (format!("{dst_prefix}{rest}"), commit.clone()))
                })
                .collect();
            if request.prune {
                remote_refs.retain(|name, _| !name.starts_with(dst_prefix) || local.contains_key(name));
            }
            remote_refs.extend(local);
        }
        Ok(())
    }
}
