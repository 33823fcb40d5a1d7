/*
 * Copyright 2025 Michael Krolikowski
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

mod reference;
mod version;

pub use reference::ImageReference;
pub use version::{is_versioned_tag, parse_version};

use oci_client::Reference;
use reference::SEPARATOR;

/// An image string as written in a container spec, e.g. `nginx:1.27@sha256:...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDefinition {
    pub name: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageDefinition {
    /// Splits `name[:tag][@digest]`. Strings the OCI reference grammar rejects
    /// (upper case, short digests) are still split, never refused.
    pub fn parse(definition: &str) -> ImageDefinition {
        definition
            .parse::<Reference>()
            .ok()
            .and_then(|reference| ImageDefinition::from_reference(definition, &reference))
            .unwrap_or_else(|| ImageDefinition::split(definition))
    }

    // `Reference` normalizes the repository, so the name is what remains of
    // the definition once digest and tag are stripped.
    fn from_reference(definition: &str, reference: &Reference) -> Option<ImageDefinition> {
        let mut name = definition;
        let digest = reference.digest().map(|digest| digest.to_string());
        if let Some(digest) = &digest {
            name = name.strip_suffix(digest.as_str())?.strip_suffix('@')?;
        }
        let tag = reference
            .tag()
            .filter(|tag| name.ends_with(&format!(":{tag}")))
            .map(|tag| tag.to_string());
        if let Some(tag) = &tag {
            name = &name[..name.len() - tag.len() - 1];
        }
        Some(ImageDefinition {
            name: name.to_string(),
            tag,
            digest,
        })
    }

    fn split(definition: &str) -> ImageDefinition {
        let (name, digest) = match definition.split_once('@') {
            Some((name, digest)) => (name, Some(digest.to_string())),
            None => (definition, None),
        };
        // a colon before the last separator belongs to the registry port
        let name_start = name.rfind(SEPARATOR).map_or(0, |i| i + 1);
        let (name, tag) = match name[name_start..].rfind(':') {
            Some(i) => (
                &name[..name_start + i],
                Some(name[name_start + i + 1..].to_string()),
            ),
            None => (name, None),
        };
        ImageDefinition {
            name: name.to_string(),
            tag,
            digest,
        }
    }

    pub fn reference(&self) -> ImageReference {
        ImageReference::resolve(&self.name)
    }

    /// An absent tag means `latest` and is therefore floating.
    pub fn tag_is_versioned(&self) -> bool {
        self.tag.as_deref().is_some_and(is_versioned_tag)
    }

    pub fn is_digest_pinned(&self) -> bool {
        self.digest.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageDefinition, ImageReference};

    fn definition(name: &str, tag: Option<&str>, digest: Option<&str>) -> ImageDefinition {
        ImageDefinition {
            name: name.to_string(),
            tag: tag.map(str::to_string),
            digest: digest.map(str::to_string),
        }
    }

    #[test]
    fn name_and_tag() {
        assert_eq!(
            ImageDefinition::parse("postgresql:13.4"),
            definition("postgresql", Some("13.4"), None)
        );
        assert_eq!(
            ImageDefinition::parse("k8s.gcr.io/etcd:3.5.0-0"),
            definition("k8s.gcr.io/etcd", Some("3.5.0-0"), None)
        );
    }

    #[test]
    fn without_tag() {
        assert_eq!(
            ImageDefinition::parse("org/image"),
            definition("org/image", None, None)
        );
    }

    #[test]
    fn registry_port() {
        assert_eq!(
            ImageDefinition::parse("localhost:5000/app"),
            definition("localhost:5000/app", None, None)
        );
        assert_eq!(
            ImageDefinition::parse("registry.local:5000/team/app:v2"),
            definition("registry.local:5000/team/app", Some("v2"), None)
        );
    }

    #[test]
    fn digest() {
        assert_eq!(
            ImageDefinition::parse("nginx@sha256:0123abcd"),
            definition("nginx", None, Some("sha256:0123abcd"))
        );
        assert_eq!(
            ImageDefinition::parse("nginx:1.27@sha256:0123abcd"),
            definition("nginx", Some("1.27"), Some("sha256:0123abcd"))
        );
    }

    #[test]
    fn full_digest() {
        let digest = format!("sha256:{}", "a".repeat(64));
        let parsed = ImageDefinition::parse(&format!("quay.io/org/app:v1.2@{digest}"));
        assert_eq!(
            parsed,
            definition("quay.io/org/app", Some("v1.2"), Some(digest.as_str()))
        );
        assert!(parsed.is_digest_pinned());
        assert!(parsed.tag_is_versioned());
    }

    #[test]
    fn name_is_kept_as_written() {
        assert_eq!(
            ImageDefinition::parse("docker.io/library/nginx:1.27"),
            definition("docker.io/library/nginx", Some("1.27"), None)
        );
        assert_eq!(
            ImageDefinition::parse("nginx"),
            definition("nginx", None, None)
        );
    }

    #[test]
    fn outside_reference_grammar() {
        assert_eq!(
            ImageDefinition::parse("Org/Image:Latest"),
            definition("Org/Image", Some("Latest"), None)
        );
        assert_eq!(
            ImageDefinition::parse("nginx@sha256:0123abcd"),
            definition("nginx", None, Some("sha256:0123abcd"))
        );
    }

    #[test]
    fn empty_tag() {
        assert_eq!(
            ImageDefinition::parse("nginx:"),
            definition("nginx", Some(""), None)
        );
        assert!(!ImageDefinition::parse("nginx:").tag_is_versioned());
    }

    #[test]
    fn reference() {
        assert_eq!(
            ImageDefinition::parse("postgresql:13").reference(),
            ImageReference::resolve("postgresql")
        );
        assert_eq!(
            ImageDefinition::parse("registry.example.com/repo/image:1.0")
                .reference()
                .registry,
            "registry.example.com"
        );
    }

    #[test]
    fn tag_classification() {
        assert!(ImageDefinition::parse("nginx:v1.23.4").tag_is_versioned());
        assert!(!ImageDefinition::parse("nginx:latest").tag_is_versioned());
        assert!(!ImageDefinition::parse("nginx").tag_is_versioned());
    }
}
