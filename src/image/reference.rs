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

use std::fmt;

use serde::Serialize;

pub const DEFAULT_REGISTRY_HOST: &str = "registry-1.docker.io";
pub const OFFICIAL_NAMESPACE: &str = "library";
pub const SEPARATOR: char = '/';

/// Registry host and repository path of a container image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ImageReference {
    pub registry: String,
    pub path: String,
}

impl ImageReference {
    fn new(registry: &str, path: &str) -> ImageReference {
        ImageReference {
            registry: registry.to_string(),
            path: path.to_string(),
        }
    }

    /// Resolves an image name the way Docker Hub tooling does.
    ///
    /// A first segment is taken as registry host if the name has exactly two
    /// separators, or exactly one separator and a `.` in the first segment.
    /// Everything else is served by [`DEFAULT_REGISTRY_HOST`]. Hosts without a
    /// dot (e.g. `registry/app`) are therefore read as Hub namespaces. An empty
    /// first segment never becomes a host.
    pub fn resolve(definition: &str) -> ImageReference {
        let separators = definition.matches(SEPARATOR).count();
        match definition.split_once(SEPARATOR) {
            None => ImageReference::new(
                DEFAULT_REGISTRY_HOST,
                &format!("{OFFICIAL_NAMESPACE}{SEPARATOR}{definition}"),
            ),
            Some((host, path))
                if !host.is_empty()
                    && (separators == 2 || (separators == 1 && host.contains('.'))) =>
            {
                ImageReference::new(host, path)
            }
            Some(_) => ImageReference::new(DEFAULT_REGISTRY_HOST, definition),
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.registry, self.path)
    }
}
