use std::any::Any;
use std::fmt::Debug;

/// A native entity with a settable string identifier
pub trait Identifiable {
    fn string_id(&self) -> Option<String>;

    /// Assign the identifier in string form. No numeric coercion is applied
    /// by the binder; entities with numeric keys parse it themselves.
    fn set_string_id(&mut self, id: &str);
}

/// Object-safe handle over any bound entity
///
/// Implemented for every `Identifiable + Clone + Debug + Send + Sync` type, so
/// entity types only implement [`Identifiable`].
pub trait Resource: Identifiable + Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_resource(&self) -> Box<dyn Resource>;
    fn native_name(&self) -> &'static str;
}

impl<T> Resource for T
where
    T: Identifiable + Clone + Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_resource(&self) -> Box<dyn Resource> {
        Box::new(self.clone())
    }

    fn native_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl Clone for Box<dyn Resource> {
    fn clone(&self) -> Self {
        self.clone_resource()
    }
}

impl dyn Resource {
    pub fn is<T: Resource>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Constructor registered alongside a native type
pub type Factory = fn() -> Box<dyn Resource>;

pub(crate) fn new_boxed<T: Resource + Default>() -> Box<dyn Resource> {
    Box::new(T::default())
}
