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

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use semver::{BuildMetadata, Prerelease, Version};

const VERSION_REGEX: &str = r"^v?([0-9]+)(?:\.([0-9]+))?(?:\.([0-9]+))?(?:-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?(?:\+([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$";

lazy_static! {
    static ref VERSION: Regex = Regex::new(VERSION_REGEX).expect("invalid VERSION_REGEX");
}

struct LooseVersion<'t> {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Option<&'t str>,
    build: Option<&'t str>,
}

fn component(caps: &Captures, index: usize) -> Option<u64> {
    match caps.get(index) {
        Some(m) => m.as_str().parse().ok(),
        None => Some(0),
    }
}

fn parse_loose(tag: &str) -> Option<LooseVersion<'_>> {
    let caps = VERSION.captures(tag)?;
    Some(LooseVersion {
        major: component(&caps, 1)?,
        minor: component(&caps, 2)?,
        patch: component(&caps, 3)?,
        pre: caps.get(4).map(|m| m.as_str()),
        build: caps.get(5).map(|m| m.as_str()),
    })
}

/// Whether a tag pins a version, as opposed to a floating tag like `latest`.
///
/// Accepts an optional `v` prefix, up to three numeric components and any
/// dot-separated pre-release or build suffix, leading zeros included
/// (`v1.0.0-2023.01.05`).
pub fn is_versioned_tag(tag: &str) -> bool {
    parse_loose(tag).is_some()
}

/// Converts a versioned tag to a semantic version, missing components
/// default to `0`: `v1.2-rc1` becomes `1.2.0-rc1`.
///
/// Returns `None` for pre-releases semver cannot represent, such as numeric
/// identifiers with leading zeros, even though the tag is versioned.
pub fn parse_version(tag: &str) -> Option<Version> {
    let loose = parse_loose(tag)?;
    let pre = match loose.pre {
        Some(pre) => Prerelease::new(pre).ok()?,
        None => Prerelease::EMPTY,
    };
    let build = match loose.build {
        Some(build) => BuildMetadata::new(build).ok()?,
        None => BuildMetadata::EMPTY,
    };
    Some(Version {
        major: loose.major,
        minor: loose.minor,
        patch: loose.patch,
        pre,
        build,
    })
}

#[cfg(test)]
mod tests {
    use semver::Version;

    use super::{is_versioned_tag, parse_version};

    #[test]
    fn versioned_tags() {
        for tag in [
            "1",
            "v1",
            "1.2",
            "1.23.4",
            "v1.23.4",
            "1.23.4-5",
            "v1.23.4-5",
            "1.23.4-rc1",
            "v1.23.4-rc1",
            "1.2.3+build.7",
            "0.0.0",
            "1.2.3-05",
            "1.23.4-01",
            "v1.0.0-2023.01.05",
            "1.2.3-rc-1",
        ] {
            assert!(is_versioned_tag(tag), "{tag} should be versioned");
        }
    }

    #[test]
    fn floating_tags() {
        for tag in [
            "latest",
            "dev",
            "",
            "v",
            "1.",
            "1.2.3.4",
            "stable-alpine",
            "1.2.3-",
            "1.2.3-rc..1",
            "1.2.3-rc.",
            "1.2.3+",
            "V1.2.3",
            " 1.2.3",
            "99999999999999999999",
        ] {
            assert!(!is_versioned_tag(tag), "{tag} should not be versioned");
        }
    }

    #[test]
    fn missing_components_default_to_zero() {
        assert_eq!(parse_version("1"), Some(Version::new(1, 0, 0)));
        assert_eq!(parse_version("v1.2"), Some(Version::new(1, 2, 0)));
        assert_eq!(parse_version("v1.23.4"), Some(Version::new(1, 23, 4)));
    }

    #[test]
    fn pre_release_and_build() {
        let version = parse_version("v1.23.4-rc1").unwrap();
        assert_eq!(version.pre.as_str(), "rc1");
        assert!(version.build.is_empty());

        let version = parse_version("1.2-5+sha.abc").unwrap();
        assert_eq!(version.to_string(), "1.2.0-5+sha.abc");
    }

    #[test]
    fn pre_release_sorts_before_release() {
        assert!(parse_version("1.23.4-rc1") < parse_version("1.23.4"));
    }

    #[test]
    fn leading_zero_pre_release_has_no_semver() {
        assert!(is_versioned_tag("v1.0.0-2023.01.05"));
        assert_eq!(parse_version("v1.0.0-2023.01.05"), None);
        assert_eq!(
            parse_version("v1.0.0-2023.1.5").map(|v| v.to_string()),
            Some("1.0.0-2023.1.5".to_string())
        );
    }

    #[test]
    fn concurrent_classification() {
        let handles: Vec<_> = ["v1.23.4-rc1", "latest", "1.2.3-05", "dev"]
            .into_iter()
            .cycle()
            .take(16)
            .map(|tag| std::thread::spawn(move || (tag, is_versioned_tag(tag))))
            .collect();
        for handle in handles {
            let (tag, versioned) = handle.join().unwrap();
            assert_eq!(versioned, is_versioned_tag(tag));
            assert_eq!(versioned, tag != "latest" && tag != "dev");
        }
    }
}
