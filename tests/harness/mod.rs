#![allow(dead_code)]

pub(crate) mod fake_gh;

pub(crate) use fake_gh::FakeGh;
