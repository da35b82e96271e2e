// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Fixture texts for templated and compiled SQL

/// Plain SQL with no template constructs
pub const PLAIN_SQL: &str = "select id, total\nfrom raw_orders\nwhere total > 0";

/// Templated model referencing another model
pub const TEMPLATED_SQL: &str =
    "select id, total\nfrom {{ ref('raw_orders') }}\nwhere total > 0";

/// The compiled expansion of [`TEMPLATED_SQL`]
pub const COMPILED_SQL: &str =
    "select id, total\nfrom `analytics`.`dataset`.`raw_orders`\nwhere total > 0";

/// Templated model with a control-flow statement spanning lines
pub const TEMPLATED_CONTROL_SQL: &str = "select id\nfrom {{ ref('users') }}\n\
{% if target.name == 'prod' %}\nwhere deleted_at is null\n{% endif %}";

/// A compiler error message carrying a source location
pub const COMPILE_ERROR_TEXT: &str =
    "Compilation Error in model orders\n  Undefined macro 'reff'\n  at line 2, column 6";
