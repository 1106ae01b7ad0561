//! Server-side renderer for `.van` single-file templates.
//!
//! A `.van` file has a `<template>` block, an optional `<script setup>` whose
//! `import X from './x.van'` lines declare child components, and any number
//! of `<style>` blocks:
//!
//! ```text
//! <script setup>
//! import SiteLayout from '../layouts/site.van'
//! </script>
//!
//! <template>
//!   <site-layout :title="title">
//!     <template #hero><h1>{{ category.title }}</h1></template>
//!     <p v-for="row in table.rows">{{ row.0 }}</p>
//!   </site-layout>
//! </template>
//! ```
//!
//! Rendering is a single pass over a parsed node tree; the same tree type is
//! used by callers that post-process rendered documents.

pub mod dom;
mod expr;
mod render;
mod sfc;

pub use expr::{escape_html, interpolate};
pub use render::{RenderError, TemplateSet};
