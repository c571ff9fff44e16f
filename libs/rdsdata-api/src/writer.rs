use crate::error::MappingError;
use crate::options::MappingOptions;
use crate::resolve::{
    Population, WriteAccessor, find_all_args_constructor, find_no_args_constructor,
    resolve_writer,
};
use crate::schema::{ConstructorInfo, Mapped, TypeInfo};
use crate::wire::{Row, WireField};

/// How rows become instances, resolved once per writer.
enum Plan<T> {
    /// All-args constructor; `indices[i]` is the column feeding parameter `i`.
    Constructor {
        constructor: ConstructorInfo<T>,
        indices: Vec<usize>,
    },
    /// No-args constructor, then one accessor per column (`None` = skipped).
    Populate {
        constructor: ConstructorInfo<T>,
        accessors: Vec<Option<WriteAccessor<T>>>,
    },
}

/// Materializes rows into instances of `T`.
///
/// Strategy: an all-args constructor whose parameter names equal the
/// column names, otherwise the no-args constructor followed by
/// per-column population. The choice is made on the first row and reused.
pub struct RowWriter<T> {
    columns: Vec<String>,
    options: MappingOptions,
    population: Population,
    plan: Option<Plan<T>>,
}

impl<T: Mapped> RowWriter<T> {
    pub fn new(columns: Vec<String>, options: MappingOptions) -> Self {
        Self {
            columns,
            options,
            population: Population::Properties,
            plan: None,
        }
    }

    pub fn with_population(mut self, population: Population) -> Self {
        self.population = population;
        self.plan = None;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn write(&mut self, row: &Row) -> Result<T, MappingError> {
        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => self.resolve()?,
        };
        let result = self.apply(&plan, row);
        self.plan = Some(plan);
        result
    }

    pub fn write_all<'a>(
        &mut self,
        rows: impl IntoIterator<Item = &'a Row>,
    ) -> Result<Vec<T>, MappingError> {
        rows.into_iter().map(|row| self.write(row)).collect()
    }

    fn resolve(&self) -> Result<Plan<T>, MappingError> {
        let info = T::type_info();

        if let Some(constructor) = find_all_args_constructor(&info, &self.columns) {
            ensure_public(&info, constructor)?;
            let indices = constructor
                .params
                .iter()
                .map(|param| {
                    self.columns.iter().position(|c| *c == param.name).ok_or_else(|| {
                        MappingError::cannot_create_instance::<T>(format!(
                            "no column for constructor parameter '{}'",
                            param.name
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            tracing::debug!(
                target_type = info.name,
                strategy = "constructor",
                columns = self.columns.len(),
                "resolved row mapping"
            );
            return Ok(Plan::Constructor {
                constructor: constructor.clone(),
                indices,
            });
        }

        let constructor = find_no_args_constructor(&info).ok_or_else(|| {
            MappingError::CannotCreateInstanceViaNoArgsConstructor {
                type_name: info.name.to_string(),
            }
        })?;
        ensure_public(&info, constructor)?;

        let mut accessors = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let accessor = resolve_writer(
                &info,
                column,
                self.population,
                self.options.ignore_missing_setters,
            )?;
            match &accessor {
                Some(a) => tracing::trace!(
                    column = %column,
                    kind = a.kind(),
                    member = a.member(),
                    "column accessor"
                ),
                None => tracing::debug!(
                    column = %column,
                    target_type = info.name,
                    "no setter or field, column skipped"
                ),
            }
            accessors.push(accessor);
        }

        tracing::debug!(
            target_type = info.name,
            strategy = ?self.population,
            columns = self.columns.len(),
            "resolved row mapping"
        );
        Ok(Plan::Populate {
            constructor: constructor.clone(),
            accessors,
        })
    }

    fn apply(&self, plan: &Plan<T>, row: &Row) -> Result<T, MappingError> {
        // Row width is not checked against the column list; absent cells read as null.
        let cell = |index: usize| row.get(index).unwrap_or(&WireField::Null);

        match plan {
            Plan::Constructor {
                constructor,
                indices,
            } => {
                let args: Vec<&WireField> = indices.iter().map(|&i| cell(i)).collect();
                constructor.build(&args)
            }
            Plan::Populate {
                constructor,
                accessors,
            } => {
                let mut instance = constructor.build(&[])?;
                for (index, accessor) in accessors.iter().enumerate() {
                    if let Some(accessor) = accessor {
                        accessor.write(&mut instance, cell(index))?;
                    }
                }
                Ok(instance)
            }
        }
    }
}

fn ensure_public<T: 'static>(
    info: &TypeInfo<T>,
    constructor: &ConstructorInfo<T>,
) -> Result<(), MappingError> {
    if constructor.visibility.is_public() {
        return Ok(());
    }
    Err(MappingError::CannotCreateInstance {
        type_name: info.name.to_string(),
        source: "constructor is not public".into(),
    })
}
