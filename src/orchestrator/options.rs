//! Translation of user flags into backend lifecycle options

use crate::backend::{CreateOptions, RecreatePolicy, StartOptions};
use crate::compose::{Project, ProjectView};
use crate::error::{DcmError, Result};

/// User-facing options of `configs up`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpFlags {
    /// Services requested on the command line; empty means all
    pub services: Vec<String>,
    /// Run containers in the background
    pub detach: bool,
    /// Create containers without starting them
    pub no_start: bool,
    /// Disable every service outside the requested ones and their dependencies
    pub only_selected: bool,
    /// Stop all containers if any container stops
    pub cascade_stop: bool,
    /// Return the exit code of this service
    pub exit_code_from: Option<String>,
    /// `SERVICE=NUM` replica assignments
    pub scale: Vec<String>,
    /// Attach to every service, not only the requested ones
    pub attach_dependencies: bool,
    /// Services to attach to
    pub attach: Vec<String>,
    /// Wait for services to be running and healthy
    pub wait: bool,
}

/// Backend-facing options for one project
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// The project as this run sees it
    pub view: ProjectView,
    pub create: CreateOptions,
    pub start: StartOptions,
    /// Run without a log consumer
    pub detach: bool,
}

impl LifecycleOptions {
    /// Effective replica count of a service
    pub fn replicas(&self, service: &str) -> Option<u32> {
        self.view.service(service).and_then(|s| s.replicas)
    }
}

/// Validate `flags` against `project` and build the options for one run.
///
/// Nothing is sent to a backend; an error means no call must be made.
pub fn translate(project: &Project, flags: &UpFlags) -> Result<LifecycleOptions> {
    let mut view = if flags.only_selected {
        let keep = project.dependency_closure(&flags.services)?;
        ProjectView::filtered(project, &keep)
    } else {
        ProjectView::all(project)
    };

    if let Some(service) = &flags.exit_code_from {
        project.service(service)?;
    }

    for spec in &flags.scale {
        let (name, replicas) = parse_scale(spec)?;
        project.service(name)?;
        if let Some(service) = view.service_mut(name) {
            service.replicas = Some(replicas);
        }
    }

    let attach_to = if !flags.attach.is_empty() {
        flags.attach.clone()
    } else if flags.attach_dependencies {
        view.enabled_names()
    } else {
        flags.services.clone()
    };

    let create = CreateOptions {
        services: flags.services.clone(),
        recreate: RecreatePolicy::Diverged,
        recreate_dependencies: RecreatePolicy::Diverged,
        remove_orphans: false,
        ignore_orphans: false,
        inherit: true,
        quiet_pull: false,
    };

    let start = StartOptions {
        attach_to,
        exit_code_from: flags.exit_code_from.clone(),
        cascade_stop: flags.cascade_stop,
        wait: flags.wait,
    };

    Ok(LifecycleOptions {
        view,
        create,
        start,
        detach: flags.detach,
    })
}

/// Parse a `SERVICE=NUM` assignment
fn parse_scale(spec: &str) -> Result<(&str, u32)> {
    let parts: Vec<&str> = spec.split('=').collect();
    let [name, count] = parts[..] else {
        return Err(DcmError::MalformedScaleSpec(spec.to_string()));
    };

    let replicas = count
        .parse::<u32>()
        .map_err(|e| DcmError::InvalidReplicaCount {
            spec: spec.to_string(),
            message: e.to_string(),
        })?;

    Ok((name, replicas))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::config::{DeployConfig, DependsOnConfig};
    use crate::compose::{Service, ServiceConfig};
    use std::path::PathBuf;

    fn service(name: &str, deps: &[&str], replicas: Option<u32>) -> Service {
        let config = ServiceConfig {
            image: Some("busybox".to_string()),
            depends_on: if deps.is_empty() {
                None
            } else {
                Some(DependsOnConfig::Array(
                    deps.iter().map(|d| d.to_string()).collect(),
                ))
            },
            deploy: replicas.map(|r| DeployConfig { replicas: Some(r) }),
            ..Default::default()
        };
        Service::new(name, config)
    }

    fn project() -> Project {
        Project {
            name: "shop".to_string(),
            working_dir: PathBuf::from("/srv/shop"),
            config_paths: vec![PathBuf::from("/srv/shop/docker-compose.yml")],
            services: vec![
                service("web", &["api"], None),
                service("api", &["db"], None),
                service("db", &[], Some(2)),
                service("docs", &[], None),
            ],
            disabled_services: Vec::new(),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scale_applies_to_named_service_only() {
        let flags = UpFlags {
            scale: strings(&["web=3"]),
            ..Default::default()
        };

        let options = translate(&project(), &flags).unwrap();

        assert_eq!(options.replicas("web"), Some(3));
        assert_eq!(options.replicas("db"), Some(2));
        assert_eq!(options.replicas("api"), None);
    }

    #[test]
    fn test_scale_does_not_touch_project() {
        let project = project();
        let flags = UpFlags {
            scale: strings(&["db=5"]),
            ..Default::default()
        };

        translate(&project, &flags).unwrap();

        assert_eq!(project.service("db").unwrap().replicas, Some(2));
    }

    #[test]
    fn test_scale_unknown_service() {
        let flags = UpFlags {
            scale: strings(&["ghost=1"]),
            ..Default::default()
        };

        let err = translate(&project(), &flags).unwrap_err();
        assert!(matches!(err, DcmError::UnknownService(name) if name == "ghost"));
    }

    #[test]
    fn test_scale_invalid_count() {
        for spec in ["web=three", "web=-1", "web="] {
            let flags = UpFlags {
                scale: strings(&[spec]),
                ..Default::default()
            };
            let err = translate(&project(), &flags).unwrap_err();
            assert!(
                matches!(err, DcmError::InvalidReplicaCount { .. }),
                "{} gave {:?}",
                spec,
                err
            );
        }
    }

    #[test]
    fn test_scale_malformed() {
        for spec in ["web", "web=1=2", ""] {
            let flags = UpFlags {
                scale: strings(&[spec]),
                ..Default::default()
            };
            let err = translate(&project(), &flags).unwrap_err();
            assert!(matches!(err, DcmError::MalformedScaleSpec(_)), "{}", spec);
        }
    }

    #[test]
    fn test_only_selected_keeps_dependencies() {
        let flags = UpFlags {
            services: strings(&["api"]),
            only_selected: true,
            ..Default::default()
        };

        let options = translate(&project(), &flags).unwrap();

        assert_eq!(options.view.enabled_names(), strings(&["api", "db"]));
        let disabled: Vec<&str> = options.view.disabled.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(disabled, vec!["web", "docs"]);
    }

    #[test]
    fn test_only_selected_unknown_service() {
        let flags = UpFlags {
            services: strings(&["ghost"]),
            only_selected: true,
            ..Default::default()
        };

        assert!(matches!(
            translate(&project(), &flags),
            Err(DcmError::UnknownService(_))
        ));
    }

    #[test]
    fn test_without_filter_everything_is_enabled() {
        let flags = UpFlags {
            services: strings(&["api"]),
            ..Default::default()
        };

        let options = translate(&project(), &flags).unwrap();

        assert_eq!(options.view.enabled.len(), 4);
        assert!(options.view.disabled.is_empty());
        assert_eq!(options.create.services, strings(&["api"]));
    }

    #[test]
    fn test_exit_code_from_must_exist() {
        let flags = UpFlags {
            exit_code_from: Some("ghost".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            translate(&project(), &flags),
            Err(DcmError::UnknownService(_))
        ));

        let flags = UpFlags {
            exit_code_from: Some("web".to_string()),
            ..Default::default()
        };
        let options = translate(&project(), &flags).unwrap();
        assert_eq!(options.start.exit_code_from.as_deref(), Some("web"));
    }

    #[test]
    fn test_attach_precedence() {
        let explicit = UpFlags {
            services: strings(&["web"]),
            attach: strings(&["db"]),
            attach_dependencies: true,
            ..Default::default()
        };
        assert_eq!(
            translate(&project(), &explicit).unwrap().start.attach_to,
            strings(&["db"])
        );

        let dependencies = UpFlags {
            services: strings(&["web"]),
            attach_dependencies: true,
            ..Default::default()
        };
        assert_eq!(
            translate(&project(), &dependencies).unwrap().start.attach_to,
            strings(&["web", "api", "db", "docs"])
        );

        let requested = UpFlags {
            services: strings(&["web"]),
            ..Default::default()
        };
        assert_eq!(
            translate(&project(), &requested).unwrap().start.attach_to,
            strings(&["web"])
        );

        let nothing = UpFlags::default();
        assert!(translate(&project(), &nothing)
            .unwrap()
            .start
            .attach_to
            .is_empty());
    }

    #[test]
    fn test_recreate_policy_is_fixed() {
        let options = translate(&project(), &UpFlags::default()).unwrap();
        assert_eq!(options.create.recreate, RecreatePolicy::Diverged);
        assert_eq!(options.create.recreate_dependencies, RecreatePolicy::Diverged);
        assert!(!options.create.remove_orphans);
    }
}
