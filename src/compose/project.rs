//! Resolved compose projects

use super::config::ServiceConfig;
use crate::error::{DcmError, Result};
use std::collections::HashSet;
use std::path::PathBuf;

/// A declared service
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// Service name
    pub name: String,
    /// Service configuration as declared
    pub config: ServiceConfig,
    /// Replica count; `None` leaves the backend default
    pub replicas: Option<u32>,
}

impl Service {
    /// Create a service from its declaration
    pub fn new(name: &str, config: ServiceConfig) -> Self {
        let replicas = config.declared_replicas();
        Self {
            name: name.to_string(),
            config,
            replicas,
        }
    }
}

/// A compose project loaded from one or more descriptor files
#[derive(Debug, Clone)]
pub struct Project {
    /// Project name
    pub name: String,
    /// Directory the project is rooted in
    pub working_dir: PathBuf,
    /// Descriptor files the project was built from
    pub config_paths: Vec<PathBuf>,
    /// Services in declaration order
    pub services: Vec<Service>,
    /// Services gated behind a profile that is not active
    pub disabled_services: Vec<Service>,
}

impl Project {
    /// Look up a service by name
    pub fn service(&self, name: &str) -> Result<&Service> {
        self.services
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| DcmError::UnknownService(name.to_string()))
    }

    /// Names of all declared services
    pub fn service_names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name.clone()).collect()
    }

    /// The requested services plus everything they transitively depend on.
    ///
    /// An empty request selects every declared service.
    pub fn dependency_closure(&self, names: &[String]) -> Result<HashSet<String>> {
        if names.is_empty() {
            return Ok(self.services.iter().map(|s| s.name.clone()).collect());
        }

        let mut closure = HashSet::new();
        let mut stack: Vec<String> = names.to_vec();

        while let Some(name) = stack.pop() {
            if closure.contains(&name) {
                continue;
            }
            let service = self.service(&name)?;
            stack.extend(service.config.dependencies());
            closure.insert(name);
        }

        Ok(closure)
    }

    /// Get service start order based on dependencies
    pub fn start_order(&self) -> Result<Vec<String>> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut visiting = HashSet::new();

        for service in &self.services {
            self.topological_sort(&service.name, &mut visited, &mut visiting, &mut order)?;
        }

        Ok(order)
    }

    fn topological_sort(
        &self,
        service: &str,
        visited: &mut HashSet<String>,
        visiting: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        if visited.contains(service) {
            return Ok(());
        }

        if visiting.contains(service) {
            return Err(DcmError::ComposeParse(format!(
                "Circular dependency detected for service: {}",
                service
            )));
        }

        visiting.insert(service.to_string());

        for dep in self.service(service)?.config.dependencies() {
            self.topological_sort(&dep, visited, visiting, order)?;
        }

        visiting.remove(service);
        visited.insert(service.to_string());
        order.push(service.to_string());

        Ok(())
    }
}

/// A filtered view over a project for one orchestration run.
///
/// The loaded [`Project`] is left untouched; scale overrides and the
/// enabled/disabled split only exist here.
#[derive(Debug, Clone)]
pub struct ProjectView {
    /// Project name
    pub name: String,
    /// Directory the project is rooted in
    pub working_dir: PathBuf,
    /// Descriptor files the project was built from
    pub config_paths: Vec<PathBuf>,
    /// Services that take part in this run
    pub enabled: Vec<Service>,
    /// Services filtered out of this run
    pub disabled: Vec<Service>,
}

impl ProjectView {
    /// View with every service enabled
    pub fn all(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            working_dir: project.working_dir.clone(),
            config_paths: project.config_paths.clone(),
            enabled: project.services.clone(),
            disabled: project.disabled_services.clone(),
        }
    }

    /// Split the project's services on membership in `keep`.
    ///
    /// Profile-disabled services stay disabled either way.
    pub fn filtered(project: &Project, keep: &HashSet<String>) -> Self {
        let (enabled, mut disabled): (Vec<Service>, Vec<Service>) = project
            .services
            .iter()
            .cloned()
            .partition(|s| keep.contains(&s.name));
        disabled.extend(project.disabled_services.iter().cloned());

        Self {
            name: project.name.clone(),
            working_dir: project.working_dir.clone(),
            config_paths: project.config_paths.clone(),
            enabled,
            disabled,
        }
    }

    /// Names of the enabled services
    pub fn enabled_names(&self) -> Vec<String> {
        self.enabled.iter().map(|s| s.name.clone()).collect()
    }

    /// Mutable access to a service, enabled or not
    pub fn service_mut(&mut self, name: &str) -> Option<&mut Service> {
        self.enabled
            .iter_mut()
            .chain(self.disabled.iter_mut())
            .find(|s| s.name == name)
    }

    /// Look up a service, enabled or not
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.enabled
            .iter()
            .chain(self.disabled.iter())
            .find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::config::DependsOnConfig;

    fn service(name: &str, deps: &[&str]) -> Service {
        let mut config = ServiceConfig {
            image: Some("busybox".to_string()),
            ..Default::default()
        };
        if !deps.is_empty() {
            config.depends_on = Some(DependsOnConfig::Array(
                deps.iter().map(|d| d.to_string()).collect(),
            ));
        }
        Service::new(name, config)
    }

    fn project(services: Vec<Service>) -> Project {
        Project {
            name: "test".to_string(),
            working_dir: PathBuf::from("/srv/test"),
            config_paths: vec![PathBuf::from("/srv/test/docker-compose.yml")],
            services,
            disabled_services: Vec::new(),
        }
    }

    #[test]
    fn test_get_start_order() {
        let project = project(vec![
            service("web", &["api"]),
            service("api", &["db"]),
            service("db", &[]),
        ]);

        let order = project.start_order().unwrap();

        let db_pos = order.iter().position(|s| s == "db").unwrap();
        let api_pos = order.iter().position(|s| s == "api").unwrap();
        let web_pos = order.iter().position(|s| s == "web").unwrap();

        assert!(db_pos < api_pos);
        assert!(api_pos < web_pos);
    }

    #[test]
    fn test_circular_dependency_detection() {
        let project = project(vec![service("a", &["b"]), service("b", &["a"])]);
        assert!(project.start_order().is_err());
    }

    #[test]
    fn test_dependency_closure_is_transitive() {
        let project = project(vec![
            service("web", &["api"]),
            service("api", &["db"]),
            service("db", &[]),
            service("docs", &[]),
        ]);

        let closure = project.dependency_closure(&["web".to_string()]).unwrap();
        assert_eq!(closure.len(), 3);
        assert!(!closure.contains("docs"));
    }

    #[test]
    fn test_dependency_closure_unknown_service() {
        let project = project(vec![service("web", &[])]);
        let err = project
            .dependency_closure(&["ghost".to_string()])
            .unwrap_err();
        assert!(matches!(err, DcmError::UnknownService(name) if name == "ghost"));
    }

    #[test]
    fn test_filtered_view_leaves_project_untouched() {
        let project = project(vec![service("web", &[]), service("docs", &[])]);
        let keep: HashSet<String> = ["web".to_string()].into_iter().collect();

        let view = ProjectView::filtered(&project, &keep);

        assert_eq!(view.enabled_names(), vec!["web"]);
        assert_eq!(view.disabled.len(), 1);
        assert_eq!(project.services.len(), 2);
    }

    #[test]
    fn test_profile_disabled_services_never_enabled() {
        let mut project = project(vec![service("web", &[])]);
        project.disabled_services.push(service("migrate", &[]));

        let all = ProjectView::all(&project);
        assert_eq!(all.enabled_names(), vec!["web"]);
        assert_eq!(all.disabled.len(), 1);

        let keep: HashSet<String> = ["web".to_string(), "migrate".to_string()]
            .into_iter()
            .collect();
        let view = ProjectView::filtered(&project, &keep);
        assert_eq!(view.enabled_names(), vec!["web"]);
        assert_eq!(view.disabled[0].name, "migrate");
    }
}
