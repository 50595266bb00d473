//! Compact array codecs used from adapters, next to the core field kinds.

use packable_compact::{CompactDecoderExt, CompactEncoderExt};
use packable_decoder::{DecodeError, PackDecoder, UnpackAdapter};
use packable_encoder::{EncodeError, PackAdapter, PackEncoder};

#[derive(Debug, Default, Clone, PartialEq)]
struct Sensor {
    online: Vec<bool>,
    states: Vec<u32>,
    counts: Vec<i32>,
    stamps: Vec<i64>,
    readings: Vec<f64>,
}

struct SensorAdapter;

impl PackAdapter<Sensor> for SensorAdapter {
    fn encode(&self, encoder: &mut PackEncoder, value: &Sensor) -> Result<(), EncodeError> {
        encoder
            .put_bool_array(0, &value.online)?
            .put_enum_array(1, &value.states)?
            .put_compact_int_array(2, &value.counts)?
            .put_compact_long_array(3, &value.stamps)?
            .put_compact_double_array(4, &value.readings)?;
        Ok(())
    }
}

impl UnpackAdapter<Sensor> for SensorAdapter {
    fn decode(&self, decoder: &mut PackDecoder<'_>) -> Result<Sensor, DecodeError> {
        Ok(Sensor {
            online: decoder.get_bool_array(0)?.unwrap_or_default(),
            states: decoder.get_enum_array(1)?.unwrap_or_default(),
            counts: decoder.get_compact_int_array(2)?.unwrap_or_default(),
            stamps: decoder.get_compact_long_array(3)?.unwrap_or_default(),
            readings: decoder.get_compact_double_array(4)?.unwrap_or_default(),
        })
    }
}

fn sensor(n: usize) -> Sensor {
    Sensor {
        online: (0..n).map(|i| i % 3 != 0).collect(),
        states: (0..n).map(|i| (i % 5) as u32).collect(),
        counts: (0..n).map(|i| if i % 4 == 0 { 0 } else { (i * i) as i32 }).collect(),
        stamps: (0..n).map(|i| 1_700_000_000_000 + i as i64).collect(),
        readings: (0..n).map(|i| i as f64 * 0.5).collect(),
    }
}

#[test]
fn sparse_ints_beat_the_fixed_layout() {
    let values = [0, 0, 0, 300, 0];
    let mut encoder = PackEncoder::new();
    encoder.put_compact_int_array(0, &values).unwrap();
    let compact = encoder.finish();
    assert!(compact.len() < values.len() * 4);

    let mut encoder = PackEncoder::new();
    encoder.put_int_array(0, &values).unwrap();
    assert!(compact.len() < encoder.finish().len());

    let mut decoder = PackDecoder::new(&compact).unwrap();
    assert_eq!(decoder.get_compact_int_array(0).unwrap().unwrap(), values);
}

#[test]
fn sensors_of_every_length() {
    for n in 0..40 {
        let value = sensor(n);
        let bytes = PackEncoder::marshal(&value, &SensorAdapter).unwrap();
        assert_eq!(PackDecoder::unmarshal(&bytes, &SensorAdapter).unwrap(), value, "n = {n}");
    }
}

#[test]
fn sensors_inside_object_arrays() {
    let sensors: Vec<Sensor> = [3, 0, 17, 250].into_iter().map(sensor).collect();
    let mut encoder = PackEncoder::new();
    encoder.put_object_array(9, &sensors, &SensorAdapter).unwrap();
    let bytes = encoder.finish();

    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert_eq!(decoder.get_object_array(9, &SensorAdapter).unwrap().unwrap(), sensors);
}

#[test]
fn compact_fields_read_as_opaque_bytes() {
    let mut encoder = PackEncoder::new();
    encoder
        .put_compact_int_array(0, &[0, 0, 0, 300, 0])
        .unwrap()
        .put_str(1, "after")
        .unwrap();
    let bytes = encoder.finish();

    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert_eq!(decoder.get_bytes(0).unwrap(), Some(&[0x05, 0x80, 0x00, 0x2C, 0x01][..]));
    assert_eq!(decoder.get_str(1).unwrap(), Some("after"));
}

#[test]
fn small_integral_doubles_shrink() {
    let whole: Vec<f64> = (1..=64).map(f64::from).collect();
    let mut encoder = PackEncoder::new();
    encoder.put_compact_double_array(0, &whole).unwrap();
    let compact = encoder.finish();

    let mut encoder = PackEncoder::new();
    encoder.put_double_array(0, &whole).unwrap();
    let fixed = encoder.finish();
    assert!(compact.len() < fixed.len() / 2);

    let mut decoder = PackDecoder::new(&compact).unwrap();
    assert_eq!(decoder.get_compact_double_array(0).unwrap().unwrap(), whole);
}
