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

use anyhow::Result;
use log::Level;
use stderrlog::Timestamp;

pub fn init(debug: bool) -> Result<()> {
    let verbosity = if debug { Level::Debug } else { Level::Info };
    stderrlog::new()
        .verbosity(verbosity)
        .timestamp(Timestamp::Millisecond)
        .init()?;
    Ok(())
}
