//! Parquet export of named matrices: a `row` string column followed
//! by one FLOAT column per matrix column.

use ndarray::prelude::*;
use parquet::basic::Type as ParquetType;
use parquet::basic::{Compression, ConvertedType, ZstdLevel};
use parquet::data_type::{ByteArray, ByteArrayType, FloatType};
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::Type;
use std::fs::File;
use std::sync::Arc;

pub struct NamedMatrixParquetWriter {
    file: File,
    schema: Arc<Type>,
    writer_properties: Arc<WriterProperties>,
    row_names: Vec<ByteArray>,
    ncols: usize,
}

impl NamedMatrixParquetWriter {
    pub fn new(
        file_path: &str,
        row_names: &[Box<str>],
        column_names: &[Box<str>],
    ) -> anyhow::Result<Self> {
        let schema = build_schema(column_names)?;
        let file = File::create(file_path)?;

        let zstd_level = ZstdLevel::try_new(5)?;
        let writer_properties = Arc::new(
            WriterProperties::builder()
                .set_compression(Compression::ZSTD(zstd_level))
                .build(),
        );

        let row_names: Vec<ByteArray> = row_names
            .iter()
            .map(|r| ByteArray::from(r.as_ref()))
            .collect();

        Ok(Self {
            file,
            schema,
            writer_properties,
            row_names,
            ncols: column_names.len(),
        })
    }

    pub fn write(&self, values: &Array2<f32>) -> anyhow::Result<()> {
        if values.nrows() != self.row_names.len() || values.ncols() != self.ncols {
            anyhow::bail!(
                "matrix is {} x {}, writer expects {} x {}",
                values.nrows(),
                values.ncols(),
                self.row_names.len(),
                self.ncols
            );
        }

        let mut writer = SerializedFileWriter::new(
            self.file.try_clone()?,
            self.schema.clone(),
            self.writer_properties.clone(),
        )?;

        let mut row_group_writer = writer.next_row_group()?;

        if let Some(mut column_writer) = row_group_writer.next_column()? {
            let typed_writer = column_writer.typed::<ByteArrayType>();
            typed_writer.write_batch(&self.row_names, None, None)?;
            column_writer.close()?;
        }

        for j in 0..values.ncols() {
            let data_j: Vec<f32> = values.column(j).to_vec();
            if let Some(mut column_writer) = row_group_writer.next_column()? {
                let typed_writer = column_writer.typed::<FloatType>();
                typed_writer.write_batch(&data_j, None, None)?;
                column_writer.close()?;
            }
        }

        row_group_writer.close()?;
        writer.close()?;
        Ok(())
    }
}

fn build_schema(column_names: &[Box<str>]) -> anyhow::Result<Arc<Type>> {
    let mut fields = vec![Arc::new(
        Type::primitive_type_builder("row", ParquetType::BYTE_ARRAY)
            .with_repetition(parquet::basic::Repetition::REQUIRED)
            .with_converted_type(ConvertedType::UTF8)
            .build()?,
    )];

    for column_name in column_names {
        fields.push(Arc::new(
            Type::primitive_type_builder(column_name, ParquetType::FLOAT)
                .with_repetition(parquet::basic::Repetition::REQUIRED)
                .build()?,
        ));
    }

    let schema = Arc::new(
        Type::group_type_builder("2dMatrix")
            .with_fields(fields)
            .build()?,
    );

    Ok(schema)
}
