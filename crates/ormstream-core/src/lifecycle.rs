//! Explicit component wiring and start/stop ordering.
//!
//! Components declare the names of the components they depend on. The
//! builder orders them so every component starts after its dependencies,
//! keeping registration order among independent components, and the running
//! application stops them in reverse.

use crate::config::Project;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle state of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentState {
    /// Constructed, not yet started.
    #[default]
    Created,
    /// Started and serving.
    Started,
    /// Stopped; no further work is accepted.
    Stopped,
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComponentState::Created => "created",
            ComponentState::Started => "started",
            ComponentState::Stopped => "stopped",
        })
    }
}

/// A component with a start/stop lifecycle.
pub trait Lifecycle: Send + Sync {
    /// Unique component name.
    fn name(&self) -> &str;

    /// Names of components that must start first.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Start the component.
    fn start(&self) -> Result<()> {
        Ok(())
    }

    /// Stop the component.
    fn stop(&self) -> Result<()> {
        Ok(())
    }
}

/// Collects components and starts them in dependency order.
#[derive(Default)]
pub struct ApplicationBuilder {
    components: Vec<Arc<dyn Lifecycle>>,
}

impl ApplicationBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component.
    pub fn with_component(mut self, component: impl Lifecycle + 'static) -> Self {
        self.components.push(Arc::new(component));
        self
    }

    /// Register a shared component.
    pub fn with_shared(mut self, component: Arc<dyn Lifecycle>) -> Self {
        self.components.push(component);
        self
    }

    /// Component names in start order.
    pub fn start_order(&self) -> Result<Vec<String>> {
        Ok(self
            .resolve()?
            .into_iter()
            .map(|i| self.components[i].name().to_string())
            .collect())
    }

    /// Start every component in dependency order.
    ///
    /// If a component fails to start, the ones already started are stopped
    /// in reverse order and the start error is returned.
    pub fn start(self) -> Result<Application> {
        let order = self.resolve()?;
        let mut started: Vec<Arc<dyn Lifecycle>> = Vec::with_capacity(order.len());

        for index in order {
            let component = Arc::clone(&self.components[index]);
            debug!(component = component.name(), "Starting component");

            if let Err(e) = component.start() {
                warn!(
                    component = component.name(),
                    error = %e,
                    "Component failed to start, rolling back"
                );
                for previous in started.iter().rev() {
                    if let Err(stop_error) = previous.stop() {
                        warn!(
                            component = previous.name(),
                            error = %stop_error,
                            "Component failed to stop during rollback"
                        );
                    }
                }
                return Err(e);
            }
            started.push(component);
        }

        info!(components = started.len(), "Application started");
        Ok(Application {
            components: started,
        })
    }

    /// Topological order of component indexes. Among ready components the
    /// earliest registered goes first.
    fn resolve(&self) -> Result<Vec<usize>> {
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        for (index, component) in self.components.iter().enumerate() {
            if by_name.insert(component.name(), index).is_some() {
                return Err(Error::Lifecycle(format!(
                    "duplicate component '{}'",
                    component.name()
                )));
            }
        }

        let mut dependencies: Vec<Vec<usize>> = Vec::with_capacity(self.components.len());
        for component in &self.components {
            let mut resolved = Vec::new();
            for dependency in component.dependencies() {
                let index = by_name.get(dependency.as_str()).ok_or_else(|| {
                    Error::Lifecycle(format!(
                        "component '{}' depends on unknown component '{}'",
                        component.name(),
                        dependency
                    ))
                })?;
                resolved.push(*index);
            }
            dependencies.push(resolved);
        }

        let mut placed = vec![false; self.components.len()];
        let mut order = Vec::with_capacity(self.components.len());
        while order.len() < self.components.len() {
            let ready = (0..self.components.len())
                .find(|&i| !placed[i] && dependencies[i].iter().all(|&d| placed[d]));

            match ready {
                Some(index) => {
                    placed[index] = true;
                    order.push(index);
                }
                None => {
                    let cycle = (0..self.components.len())
                        .filter(|&i| !placed[i])
                        .map(|i| self.components[i].name().to_string())
                        .collect();
                    return Err(Error::DependencyCycle(cycle));
                }
            }
        }
        Ok(order)
    }
}

/// Running components, in start order.
pub struct Application {
    components: Vec<Arc<dyn Lifecycle>>,
}

impl Application {
    /// Component names in start order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Stop every component in reverse start order.
    ///
    /// All components are asked to stop even if one fails; the first
    /// failure is returned.
    pub fn stop(self) -> Result<()> {
        let mut first_error = None;
        for component in self.components.iter().rev() {
            debug!(component = component.name(), "Stopping component");
            if let Err(e) = component.stop() {
                warn!(component = component.name(), error = %e, "Component failed to stop");
                first_error.get_or_insert(e);
            }
        }
        info!(components = self.components.len(), "Application stopped");
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("components", &self.component_names())
            .finish()
    }
}

/// Component owning the project document; validated on start.
pub struct ProjectComponent {
    project: Arc<Project>,
    state: RwLock<ComponentState>,
}

impl ProjectComponent {
    /// Name managers use to depend on the project document.
    pub const NAME: &'static str = "project";

    /// Wrap a project document.
    pub fn new(project: Arc<Project>) -> Self {
        Self {
            project,
            state: RwLock::new(ComponentState::Created),
        }
    }

    /// The shared document.
    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    /// Current state.
    pub fn state(&self) -> ComponentState {
        *self.state.read()
    }
}

impl Lifecycle for ProjectComponent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn start(&self) -> Result<()> {
        self.project.validate()?;
        info!(
            project = %self.project.name,
            tables = self.project.tables().len(),
            "Project document validated"
        );
        *self.state.write() = ComponentState::Started;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        *self.state.write() = ComponentState::Stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Probe {
        name: String,
        dependencies: Vec<String>,
        fail_start: bool,
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Probe {
        fn new(name: &str, dependencies: &[&str], events: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
                fail_start: false,
                events: Arc::clone(events),
            }
        }

        fn failing(mut self) -> Self {
            self.fail_start = true;
            self
        }
    }

    impl Lifecycle for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        fn dependencies(&self) -> Vec<String> {
            self.dependencies.clone()
        }

        fn start(&self) -> Result<()> {
            if self.fail_start {
                return Err(Error::Lifecycle(format!("{} refused", self.name)));
            }
            self.events.lock().push(format!("start {}", self.name));
            Ok(())
        }

        fn stop(&self) -> Result<()> {
            self.events.lock().push(format!("stop {}", self.name));
            Ok(())
        }
    }

    #[test]
    fn test_dependency_order_with_registration_ties() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let builder = ApplicationBuilder::new()
            .with_component(Probe::new("b", &["a"], &events))
            .with_component(Probe::new("c", &[], &events))
            .with_component(Probe::new("a", &[], &events));

        assert_eq!(builder.start_order().unwrap(), vec!["c", "a", "b"]);

        let application = builder.start().unwrap();
        assert_eq!(application.component_names(), vec!["c", "a", "b"]);
        application.stop().unwrap();

        assert_eq!(
            *events.lock(),
            vec!["start c", "start a", "start b", "stop b", "stop a", "stop c"]
        );
    }

    #[test]
    fn test_cycle_detected() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let result = ApplicationBuilder::new()
            .with_component(Probe::new("root", &[], &events))
            .with_component(Probe::new("x", &["y"], &events))
            .with_component(Probe::new("y", &["x"], &events))
            .start();

        match result {
            Err(Error::DependencyCycle(names)) => assert_eq!(names, vec!["x", "y"]),
            other => panic!("expected cycle, got {:?}", other),
        }
        assert!(events.lock().is_empty());
    }

    #[test]
    fn test_unknown_and_duplicate_components() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let unknown = ApplicationBuilder::new()
            .with_component(Probe::new("a", &["missing"], &events))
            .start_order();
        assert!(matches!(unknown, Err(Error::Lifecycle(_))));

        let duplicate = ApplicationBuilder::new()
            .with_component(Probe::new("a", &[], &events))
            .with_component(Probe::new("a", &[], &events))
            .start_order();
        assert!(matches!(duplicate, Err(Error::Lifecycle(_))));
    }

    #[test]
    fn test_failed_start_rolls_back() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let result = ApplicationBuilder::new()
            .with_component(Probe::new("a", &[], &events))
            .with_component(Probe::new("b", &["a"], &events))
            .with_component(Probe::new("c", &["b"], &events).failing())
            .start();

        assert!(matches!(result, Err(Error::Lifecycle(_))));
        assert_eq!(*events.lock(), vec!["start a", "start b", "stop b", "stop a"]);
    }

    #[test]
    fn test_project_component_validates() {
        use crate::config::{Column, Dbms, Schema, Table};
        use crate::config::ScalarType;
        use crate::sql::DbmsType;

        let broken = Table::new("t")
            .with_column(Column::new("id", ScalarType::Int64))
            .with_primary_key(["missing"]);
        let project = Project::new("p").with_dbms(
            Dbms::new("db", DbmsType::Generic).with_schema(Schema::new("s").with_table(broken)),
        );

        let component = ProjectComponent::new(Arc::new(project));
        assert!(matches!(component.start(), Err(Error::Config(_))));
        assert_eq!(component.state(), ComponentState::Created);

        let component = ProjectComponent::new(Arc::new(Project::new("empty")));
        component.start().unwrap();
        assert_eq!(component.state(), ComponentState::Started);
        component.stop().unwrap();
        assert_eq!(component.state(), ComponentState::Stopped);
    }
}
