//! Property / Dependency Graph
//!
//! Typed cached values with declared dependencies. Derived properties carry a
//! compute closure and recompute lazily:
//!
//! - [`Property::set`] stores a value, marks it clean and dirties every
//!   dependent (transitively).
//! - [`Property::get`] returns the cached value, first running the compute
//!   closure if the property is dirty. Dependencies are brought up to date by
//!   the closure itself when it reads them, so propagation is pull based.
//!
//! The graph lives on a single thread (`Rc`/`RefCell`). Dependents are held
//! weakly by their dependencies so dropping the owner of a derived property
//! releases it.
//!
//! # Example
//!
//! ```rust,ignore
//! use ibl_baker::property::{FloatProperty, Property};
//!
//! let a = FloatProperty::new("a", 2.0);
//! let doubled = {
//!     let a = a.clone();
//!     FloatProperty::computed("doubled", 0.0, move || a.get() * 2.0)
//! };
//! doubled.add_dependency(&a, 0);
//!
//! assert_eq!(doubled.get(), 4.0);
//! a.set(5.0);
//! assert_eq!(doubled.get(), 10.0);
//! ```

pub mod transform;

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec3};

use crate::device::TextureKey;
use crate::errors::{BakerError, Result};

pub use transform::{TransformProperty, TransformSlot};

/// Process-unique identifier of a property cell.
pub type PropertyId = u64;

/// Caller-defined role of a dependency edge (e.g. translation vs. parent).
pub type DependencyId = u32;

static NEXT_PROPERTY_ID: AtomicU64 = AtomicU64::new(1);

/// Type-erased view of a property cell used for dirty propagation.
pub trait PropertyNode {
    fn id(&self) -> PropertyId;
    fn name(&self) -> &str;
    fn is_dirty(&self) -> bool;
    /// Marks this node dirty and forwards to its dependents.
    fn mark_dirty(&self);
    fn add_dependent(&self, dependent: Weak<dyn PropertyNode>);
    fn remove_dependent(&self, id: PropertyId);
}

type ComputeFn<T> = Box<dyn Fn() -> T>;

struct PropertyCell<T> {
    id: PropertyId,
    name: Cow<'static, str>,
    value: RefCell<T>,
    dirty: Cell<bool>,
    evaluating: Cell<bool>,
    dependencies: RefCell<Vec<(Rc<dyn PropertyNode>, DependencyId)>>,
    dependents: RefCell<Vec<Weak<dyn PropertyNode>>>,
    compute: RefCell<Option<ComputeFn<T>>>,
}

impl<T> PropertyNode for PropertyCell<T> {
    fn id(&self) -> PropertyId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    fn mark_dirty(&self) {
        // A dirty node already has dirty dependents; stopping here also
        // terminates propagation around a cycle.
        if self.dirty.replace(true) {
            return;
        }
        self.notify_dependents();
    }

    fn add_dependent(&self, dependent: Weak<dyn PropertyNode>) {
        self.dependents.borrow_mut().push(dependent);
    }

    fn remove_dependent(&self, id: PropertyId) {
        self.dependents
            .borrow_mut()
            .retain(|weak| weak.upgrade().is_some_and(|node| node.id() != id));
    }
}

impl<T> PropertyCell<T> {
    fn notify_dependents(&self) {
        // Collect first: a dependent may add or remove edges on us while it
        // handles the notification.
        let live: Vec<Rc<dyn PropertyNode>> = {
            let mut dependents = self.dependents.borrow_mut();
            dependents.retain(|weak| weak.strong_count() > 0);
            dependents.iter().filter_map(Weak::upgrade).collect()
        };
        for node in live {
            node.mark_dirty();
        }
    }
}

/// A typed cached value in the dependency graph.
///
/// Cloning a `Property` clones the handle, not the value: both handles
/// observe the same cell.
pub struct Property<T> {
    cell: Rc<PropertyCell<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: Clone + 'static> Property<T> {
    /// Creates a plain (clean) value property.
    pub fn new(name: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self::with_state(name.into(), value, false, None)
    }

    /// Creates a derived property. It starts dirty, so the first read runs
    /// `compute`.
    pub fn computed(
        name: impl Into<Cow<'static, str>>,
        initial: T,
        compute: impl Fn() -> T + 'static,
    ) -> Self {
        Self::with_state(name.into(), initial, true, Some(Box::new(compute)))
    }

    fn with_state(
        name: Cow<'static, str>,
        value: T,
        dirty: bool,
        compute: Option<ComputeFn<T>>,
    ) -> Self {
        Self {
            cell: Rc::new(PropertyCell {
                id: NEXT_PROPERTY_ID.fetch_add(1, Ordering::Relaxed),
                name,
                value: RefCell::new(value),
                dirty: Cell::new(dirty),
                evaluating: Cell::new(false),
                dependencies: RefCell::new(Vec::new()),
                dependents: RefCell::new(Vec::new()),
                compute: RefCell::new(compute),
            }),
        }
    }

    /// Returns the up-to-date value.
    ///
    /// A cyclic read is logged and answered with the last cached value.
    pub fn get(&self) -> T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => {
                log::error!("{err}");
                self.cell.value.borrow().clone()
            }
        }
    }

    /// Returns the up-to-date value, failing if this property is re-entered
    /// while its own compute closure runs.
    pub fn try_get(&self) -> Result<T> {
        let cell = &self.cell;
        if cell.evaluating.get() {
            return Err(BakerError::PropertyCycle {
                name: cell.name.to_string(),
            });
        }

        if cell.dirty.get() {
            // Cleared before computing so that a dependency written during
            // the closure leaves us dirty again.
            cell.dirty.set(false);
            cell.evaluating.set(true);
            let computed = cell.compute.borrow().as_ref().map(|compute| compute());
            cell.evaluating.set(false);

            if let Some(value) = computed {
                *cell.value.borrow_mut() = value;
            }
        }

        Ok(cell.value.borrow().clone())
    }

    /// Stores `value`, marks the property clean and dirties its dependents.
    pub fn set(&self, value: T) {
        *self.cell.value.borrow_mut() = value;
        self.cell.dirty.set(false);
        self.cell.notify_dependents();
    }

    /// Replaces the compute closure. The property becomes dirty.
    pub fn set_compute(&self, compute: impl Fn() -> T + 'static) {
        *self.cell.compute.borrow_mut() = Some(Box::new(compute));
        self.cell.mark_dirty();
    }

    /// Records a directed edge `dependency -> self` tagged with `id`.
    pub fn add_dependency<U: Clone + 'static>(&self, dependency: &Property<U>, id: DependencyId) {
        let node: Rc<dyn PropertyNode> = dependency.cell.clone();
        let me: Rc<dyn PropertyNode> = self.cell.clone();

        node.add_dependent(Rc::downgrade(&me));
        self.cell.dependencies.borrow_mut().push((node, id));
        self.cell.mark_dirty();
    }

    /// Removes the edge previously added with the same dependency and id.
    pub fn remove_dependency<U: Clone + 'static>(&self, dependency: &Property<U>, id: DependencyId) {
        let target = dependency.id();
        let mut removed = false;
        {
            let mut dependencies = self.cell.dependencies.borrow_mut();
            if let Some(pos) = dependencies
                .iter()
                .position(|(node, dep_id)| node.id() == target && *dep_id == id)
            {
                dependencies.remove(pos);
                removed = true;
            }
        }

        if removed {
            let still_linked = self
                .cell
                .dependencies
                .borrow()
                .iter()
                .any(|(node, _)| node.id() == target);
            if !still_linked {
                dependency.cell.remove_dependent(self.id());
            }
            self.cell.mark_dirty();
        }
    }
}

impl<T> Property<T> {
    #[inline]
    #[must_use]
    pub fn id(&self) -> PropertyId {
        self.cell.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.cell.name
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.cell.dirty.get()
    }

    /// Forces recomputation on the next read.
    pub fn mark_dirty(&self) {
        self.cell.mark_dirty();
    }

    /// Lists `(dependency id, role)` pairs of the incoming edges.
    #[must_use]
    pub fn dependencies(&self) -> Vec<(PropertyId, DependencyId)> {
        self.cell
            .dependencies
            .borrow()
            .iter()
            .map(|(node, id)| (node.id(), *id))
            .collect()
    }

    /// Number of live dependents.
    #[must_use]
    pub fn dependent_count(&self) -> usize {
        self.cell
            .dependents
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.cell.name)
            .field("value", &self.cell.value.borrow())
            .field("dirty", &self.cell.dirty.get())
            .finish()
    }
}

pub type FloatProperty = Property<f32>;
pub type IntProperty = Property<i32>;
pub type UIntProperty = Property<u32>;
pub type BoolProperty = Property<bool>;
pub type Vector3Property = Property<Vec3>;
pub type MatrixProperty = Property<Mat4>;
pub type TextureProperty = Property<Option<TextureKey>>;
